//! wddm CLI - Command-line interface for weber-ddm
//!
//! Commands:
//! - prepare: Clean a trial table and derive Weber fractions
//! - validate: Check that a trial table can be prepared
//! - job: Write the prepared table and model job for the sampler
//! - summarize: Posterior means of selected nodes
//! - histogram: Binned posterior samples of one node
//! - report: Plot data of a fitted job
//! - doctor: Diagnose input files and configuration

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use weber_ddm::model::{
    FileFitter, HierarchicalFitter, ModelJob, ModelSpec, ModelVariant, JOB_FILE_NAME,
    STATS_FILE_NAME, TRACES_FILE_NAME,
};
use weber_ddm::posterior::{
    BarSeries, Histogram, NameFilter, PosteriorReport, SummaryStats, TraceStore, DEFAULT_BINS,
};
use weber_ddm::schema::{PrepConfig, RawTable};
use weber_ddm::{DdmParameter, PrepError, Preparer, PREP_VERSION, PRODUCER_NAME};

/// wddm - Trial preparation and posterior summaries for hierarchical DDMs
#[derive(Parser)]
#[command(name = "wddm")]
#[command(version = PREP_VERSION)]
#[command(
    about = "Prepare numerosity trials for hierarchical drift-diffusion models",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a trial table and derive Weber fractions
    Prepare {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Preparation settings (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the preparation report to stderr
        #[arg(long)]
        report: bool,
    },

    /// Check that a trial table can be prepared
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Preparation settings (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the prepared table and model job for the sampler
    Job {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Analysis preset
        #[arg(long, value_enum, default_value = "regression")]
        variant: ModelVariant,

        /// Model spec (JSON), replaces the preset
        #[arg(long)]
        spec: Option<PathBuf>,

        /// Preparation settings (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory receiving data.csv and job.json
        #[arg(long)]
        out_dir: PathBuf,
    },

    /// Posterior means of selected nodes
    Summarize {
        /// Summary statistics file
        #[arg(long)]
        stats: PathBuf,

        /// Select nodes whose name starts with this text
        #[arg(long, conflicts_with = "param")]
        prefix: Option<String>,

        /// Select the nodes of one DDM parameter (v, a, t, ...)
        #[arg(long)]
        param: Option<String>,

        /// Condition level of a stratified parameter (with --param)
        #[arg(long, requires = "param")]
        level: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Binned posterior samples of one node
    Histogram {
        /// Traces file
        #[arg(long)]
        traces: PathBuf,

        /// Node name, e.g. v_numFW
        #[arg(long)]
        param: String,

        /// Number of bins
        #[arg(long, default_value_t = DEFAULT_BINS)]
        bins: usize,

        /// Report raw counts instead of densities
        #[arg(long)]
        counts: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Plot data of a fitted job
    Report {
        /// Job directory written by `wddm job`
        #[arg(long)]
        job_dir: PathBuf,

        /// Summary statistics file (defaults to <job_dir>/stats.csv)
        #[arg(long)]
        stats: Option<PathBuf>,

        /// Traces file (defaults to <job_dir>/traces.csv)
        #[arg(long)]
        traces: Option<PathBuf>,

        /// Number of histogram bins
        #[arg(long, default_value_t = DEFAULT_BINS)]
        bins: usize,
    },

    /// Diagnose input files and configuration
    Doctor {
        /// Trial table to check
        #[arg(long)]
        input: Option<PathBuf>,

        /// Preparation settings (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), WddmCliError> {
    match cli.command {
        Commands::Prepare {
            input,
            output,
            config,
            report,
        } => cmd_prepare(&input, &output, config.as_deref(), report),

        Commands::Validate {
            input,
            config,
            json,
        } => cmd_validate(&input, config.as_deref(), json),

        Commands::Job {
            input,
            variant,
            spec,
            config,
            out_dir,
        } => cmd_job(&input, variant, spec.as_deref(), config.as_deref(), &out_dir),

        Commands::Summarize {
            stats,
            prefix,
            param,
            level,
            json,
        } => cmd_summarize(&stats, prefix, param.as_deref(), level.as_deref(), json),

        Commands::Histogram {
            traces,
            param,
            bins,
            counts,
            json,
        } => cmd_histogram(&traces, &param, bins, !counts, json),

        Commands::Report {
            job_dir,
            stats,
            traces,
            bins,
        } => cmd_report(&job_dir, stats.as_deref(), traces.as_deref(), bins),

        Commands::Doctor {
            input,
            config,
            json,
        } => cmd_doctor(input.as_deref(), config.as_deref(), json),
    }
}

fn cmd_prepare(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    report: bool,
) -> Result<(), WddmCliError> {
    let preparer = Preparer::with_config(load_config(config)?)?;
    let table = preparer.prepare_str(&read_input(input)?)?;

    let data = table.to_csv_string()?;
    if output.to_string_lossy() == "-" {
        let mut stdout = io::stdout();
        stdout.write_all(data.as_bytes())?;
        stdout.flush()?;
    } else {
        fs::write(output, data)?;
    }

    if report {
        eprintln!("{}", serde_json::to_string_pretty(&table.report)?);
    }
    Ok(())
}

fn cmd_validate(input: &Path, config: Option<&Path>, json: bool) -> Result<(), WddmCliError> {
    let preparer = Preparer::with_config(load_config(config)?)?;
    let outcome = preparer.prepare_str(&read_input(input)?);

    let report = match &outcome {
        Ok(table) => ValidationReport {
            valid: true,
            rows_read: Some(table.report.rows_read),
            rows_dropped: Some(table.report.rows_dropped),
            rows_kept: Some(table.report.rows_kept),
            subjects: Some(table.subjects().len()),
            error: None,
        },
        Err(e) => ValidationReport {
            valid: false,
            rows_read: None,
            rows_dropped: None,
            rows_kept: None,
            subjects: None,
            error: Some(e.to_string()),
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        match &outcome {
            Ok(table) => {
                println!("Rows read:    {}", table.report.rows_read);
                println!("Rows dropped: {}", table.report.rows_dropped);
                println!("Rows kept:    {}", table.report.rows_kept);
                println!("Subjects:     {}", table.subjects().len());
                if !table.passthrough_columns.is_empty() {
                    println!("Passthrough:  {}", table.passthrough_columns.join(", "));
                }
            }
            Err(e) => println!("Error: {e}"),
        }
    }

    if report.valid {
        Ok(())
    } else {
        Err(WddmCliError::ValidationFailed)
    }
}

fn cmd_job(
    input: &Path,
    variant: ModelVariant,
    spec: Option<&Path>,
    config: Option<&Path>,
    out_dir: &Path,
) -> Result<(), WddmCliError> {
    let preparer = Preparer::with_config(load_config(config)?)?;
    let table = preparer.prepare_str(&read_input(input)?)?;

    let job = match spec {
        Some(path) => ModelJob::new(ModelSpec::from_json(&fs::read_to_string(path)?)?, &table)?,
        None => ModelJob::for_variant(variant, &table)?,
    };

    let manifest = job.write_bundle(&table, out_dir)?;
    println!("{}", manifest.display());
    Ok(())
}

fn cmd_summarize(
    stats: &Path,
    prefix: Option<String>,
    param: Option<&str>,
    level: Option<&str>,
    json: bool,
) -> Result<(), WddmCliError> {
    let stats = SummaryStats::from_path(stats)?;

    let (filter, title) = match (prefix, param) {
        (Some(prefix), _) => (
            NameFilter::Prefix(prefix.clone()),
            format!("Nodes starting with {prefix}"),
        ),
        (None, Some(param)) => {
            let parameter: DdmParameter = param.parse()?;
            match level {
                Some(level) => (
                    NameFilter::subject_condition(parameter, level),
                    format!("Posterior means of {parameter} for condition {level}"),
                ),
                None => (
                    NameFilter::parameter(parameter),
                    format!("Posterior means of {parameter} nodes"),
                ),
            }
        }
        (None, None) => return Err(WddmCliError::NoFilter),
    };

    let series = stats.bar_series(&filter, &title);
    if series.is_empty() {
        return Err(WddmCliError::NoMatches(filter.pattern().to_string()));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
    } else {
        print_bars(&series);
    }
    Ok(())
}

fn cmd_histogram(
    traces: &Path,
    param: &str,
    bins: usize,
    density: bool,
    json: bool,
) -> Result<(), WddmCliError> {
    let store = TraceStore::from_path(traces)?;
    let histogram = store.histogram(param, bins, density)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&histogram)?);
    } else {
        print_histogram(&histogram);
    }
    Ok(())
}

fn cmd_report(
    job_dir: &Path,
    stats: Option<&Path>,
    traces: Option<&Path>,
    bins: usize,
) -> Result<(), WddmCliError> {
    let job = ModelJob::from_json(&fs::read_to_string(job_dir.join(JOB_FILE_NAME))?)?;

    let table = job.read_table(job_dir)?;

    let fitter: Box<dyn HierarchicalFitter> = match (stats, traces) {
        (None, None) => Box::new(FileFitter::in_dir(job_dir)),
        (stats, traces) => Box::new(FileFitter::new(
            stats.map(Path::to_path_buf).unwrap_or_else(|| job_dir.join(STATS_FILE_NAME)),
            traces.map(Path::to_path_buf).unwrap_or_else(|| job_dir.join(TRACES_FILE_NAME)),
        )),
    };

    let fit = fitter.fit(&job, &table)?;
    let report = PosteriorReport::build(&job, &fit, bins)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_doctor(input: Option<&Path>, config: Option<&Path>, json: bool) -> Result<(), WddmCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, PREP_VERSION),
    });

    let prep_config = match load_config(config) {
        Ok(c) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: if config.is_some() {
                    "Settings file valid".to_string()
                } else {
                    "Using default column layout".to_string()
                },
            });
            Some(c)
        }
        Err(e) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Invalid settings: {}", CliError::from(e).message),
            });
            None
        }
    };

    if let (Some(path), Some(prep_config)) = (input, prep_config.as_ref()) {
        match RawTable::from_path(path, prep_config) {
            Ok(raw) => {
                let missing = raw.missing_columns(&prep_config.columns);
                if missing.is_empty() {
                    checks.push(DoctorCheck {
                        name: "columns".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "All required columns present ({:?} form, {} rows)",
                            raw.form(&prep_config.columns),
                            raw.len()
                        ),
                    });
                } else {
                    checks.push(DoctorCheck {
                        name: "columns".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Missing columns: {}", missing.join(", ")),
                    });
                }

                let null_rows = raw
                    .rows()
                    .iter()
                    .filter(|row| row.iter().any(|cell| prep_config.is_na(cell)))
                    .count();
                checks.push(DoctorCheck {
                    name: "nulls".to_string(),
                    status: if null_rows > 0 { CheckStatus::Warning } else { CheckStatus::Ok },
                    message: format!("{null_rows} rows with missing cells will be dropped"),
                });
            }
            Err(e) => {
                checks.push(DoctorCheck {
                    name: "input".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read input: {e}"),
                });
            }
        }
    }

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: PREP_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("wddm Doctor Report");
        println!("==================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(WddmCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, WddmCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            log::warn!("reading trials from an interactive terminal, end input with Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_config(path: Option<&Path>) -> Result<PrepConfig, WddmCliError> {
    match path {
        Some(path) => Ok(PrepConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(PrepConfig::default()),
    }
}

fn print_bars(series: &BarSeries) {
    println!("{}", series.title);
    let width = series.labels.iter().map(String::len).max().unwrap_or(0);
    for (label, value) in series.labels.iter().zip(&series.values) {
        println!("  {label:<width$}  {value:>10.4}");
    }
}

fn print_histogram(histogram: &Histogram) {
    let kind = if histogram.density { "density" } else { "count" };
    println!("{} ({} bins, {})", histogram.parameter, histogram.bins(), kind);
    for (i, value) in histogram.values.iter().enumerate() {
        println!(
            "  [{:>10.4}, {:>10.4})  {:>10.4}",
            histogram.edges[i],
            histogram.edges[i + 1],
            value
        );
    }
}

// Error types

#[derive(Debug)]
enum WddmCliError {
    Io(io::Error),
    Prep(PrepError),
    Json(serde_json::Error),
    ValidationFailed,
    DoctorFailed,
    NoFilter,
    NoMatches(String),
}

impl From<io::Error> for WddmCliError {
    fn from(e: io::Error) -> Self {
        WddmCliError::Io(e)
    }
}

impl From<PrepError> for WddmCliError {
    fn from(e: PrepError) -> Self {
        WddmCliError::Prep(e)
    }
}

impl From<serde_json::Error> for WddmCliError {
    fn from(e: serde_json::Error) -> Self {
        WddmCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<WddmCliError> for CliError {
    fn from(e: WddmCliError) -> Self {
        match e {
            WddmCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            WddmCliError::Prep(e) => {
                let (code, hint) = match &e {
                    PrepError::MissingColumn(_) => (
                        "MISSING_COLUMN",
                        "Run 'wddm doctor --input <file>' to list missing columns",
                    ),
                    PrepError::DuplicateColumn(_) => (
                        "DUPLICATE_COLUMN",
                        "Remove or rename the column that clashes with a prepared column",
                    ),
                    PrepError::ZeroDenominator { .. } => (
                        "ZERO_DENOMINATOR",
                        "Both stimuli of a pair are zero; fix or remove the trial",
                    ),
                    PrepError::InvalidFormula { .. } | PrepError::InvalidModel(_) => (
                        "INVALID_MODEL",
                        "Check the model spec against the prepared columns",
                    ),
                    PrepError::InvalidConfig(_) => ("INVALID_CONFIG", "Check the settings file"),
                    PrepError::UnknownParameter(_) => (
                        "UNKNOWN_PARAMETER",
                        "Check node names in the sampler output",
                    ),
                    _ => ("PREP_ERROR", "Check input format"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            WddmCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            WddmCliError::ValidationFailed => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: "Trial table cannot be prepared".to_string(),
                hint: Some("Fix the reported row and retry".to_string()),
            },
            WddmCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            WddmCliError::NoFilter => CliError {
                code: "NO_FILTER".to_string(),
                message: "No node selection given".to_string(),
                hint: Some("Pass --prefix or --param".to_string()),
            },
            WddmCliError::NoMatches(pattern) => CliError {
                code: "NO_MATCHES".to_string(),
                message: format!("No nodes match {pattern:?}"),
                hint: Some("List node names in the statistics file".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    valid: bool,
    rows_read: Option<usize>,
    rows_dropped: Option<usize>,
    rows_kept: Option<usize>,
    subjects: Option<usize>,
    error: Option<String>,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

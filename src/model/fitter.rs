//! Sampler seam
//!
//! Sampling itself happens outside this crate. [`HierarchicalFitter`] is the
//! boundary: given a job and its table it yields summary statistics and
//! traces. [`FileFitter`] picks up the files a sampler run left behind.

use crate::error::PrepError;
use crate::model::job::ModelJob;
use crate::posterior::{SummaryStats, TraceStore};
use crate::types::PreparedTable;
use log::info;
use std::path::{Path, PathBuf};

/// Default file name of the summary statistics in a job directory
pub const STATS_FILE_NAME: &str = "stats.csv";

/// Default file name of the traces in a job directory
pub const TRACES_FILE_NAME: &str = "traces.csv";

/// Posterior output of one fit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FitOutput {
    pub stats: SummaryStats,
    pub traces: TraceStore,
}

/// Trait for hierarchical DDM samplers
pub trait HierarchicalFitter {
    /// Fit the job's model to the prepared table
    fn fit(&self, job: &ModelJob, table: &PreparedTable) -> Result<FitOutput, PrepError>;
}

/// Reads the output an external sampler wrote for a job
pub struct FileFitter {
    stats_path: PathBuf,
    traces_path: PathBuf,
}

impl FileFitter {
    pub fn new(stats_path: impl Into<PathBuf>, traces_path: impl Into<PathBuf>) -> Self {
        Self {
            stats_path: stats_path.into(),
            traces_path: traces_path.into(),
        }
    }

    /// Output files with their default names inside a job directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(STATS_FILE_NAME), dir.join(TRACES_FILE_NAME))
    }

    /// Load the output and check it covers every regression coefficient of
    /// the job
    pub fn load(&self, job: &ModelJob) -> Result<FitOutput, PrepError> {
        let stats = SummaryStats::from_path(&self.stats_path)?;
        let traces = TraceStore::from_path(&self.traces_path)?;

        for name in job.spec.coefficient_names() {
            if stats.get(&name).is_none() {
                return Err(PrepError::UnknownParameter(format!(
                    "{name} missing from {}",
                    self.stats_path.display()
                )));
            }
        }

        info!(
            "loaded {} nodes and {} traces for job {}",
            stats.len(),
            traces.len(),
            job.job_id
        );
        Ok(FitOutput { stats, traces })
    }
}

impl HierarchicalFitter for FileFitter {
    fn fit(&self, job: &ModelJob, _table: &PreparedTable) -> Result<FitOutput, PrepError> {
        self.load(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelVariant;
    use crate::pipeline::prepare_csv;
    use crate::schema::PrepConfig;
    use pretty_assertions::assert_eq;
    use std::fs;

    const TRIALS: &str = "id,correcta,rt,numAZ,numAM,pixAZ,pixAM,envAZ,envAM\n\
                          S01,1,850,4,8,10,10,0,5\n\
                          S02,0,1210,9,12,40,36,2,6\n";

    const STATS: &str = ",mean,std\n\
                         v_Intercept,0.9,0.2\n\
                         v_numFW,-1.1,0.3\n\
                         v_pixFW,0.2,0.1\n\
                         v_envFW,0.05,0.1\n\
                         a_Intercept,1.2,0.1\n\
                         a_rt,0.4,0.05\n\
                         t,0.28,0.02\n";

    const TRACES: &str = "v_numFW,v_pixFW,v_envFW,a_rt\n\
                          -1.0,0.2,0.0,0.4\n\
                          -1.2,0.1,0.1,0.5\n";

    fn job_dir(stats: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("weber-ddm-fit-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(STATS_FILE_NAME), stats).unwrap();
        fs::write(dir.join(TRACES_FILE_NAME), TRACES).unwrap();
        dir
    }

    #[test]
    fn test_file_fitter_loads_output() {
        let table = prepare_csv(TRIALS, &PrepConfig::default()).unwrap();
        let job = ModelJob::for_variant(ModelVariant::Regression, &table).unwrap();
        let dir = job_dir(STATS);

        let fitter: &dyn HierarchicalFitter = &FileFitter::in_dir(&dir);
        let fit = fitter.fit(&job, &table).unwrap();
        assert_eq!(fit.stats.len(), 7);
        assert_eq!(fit.traces.len(), 4);
        assert_eq!(fit.stats.mean("a_rt").unwrap(), 0.4);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_coefficient() {
        let table = prepare_csv(TRIALS, &PrepConfig::default()).unwrap();
        let job = ModelJob::for_variant(ModelVariant::Regression, &table).unwrap();
        let dir = job_dir(",mean\nv_Intercept,0.9\nt,0.3\n");

        let result = FileFitter::in_dir(&dir).load(&job);
        assert!(matches!(
            result,
            Err(PrepError::UnknownParameter(msg)) if msg.starts_with("v_numFW")
        ));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_files() {
        let table = prepare_csv(TRIALS, &PrepConfig::default()).unwrap();
        let job = ModelJob::for_variant(ModelVariant::Baseline, &table).unwrap();
        let fitter = FileFitter::new("/nonexistent/stats.csv", "/nonexistent/traces.csv");
        assert!(matches!(fitter.load(&job), Err(PrepError::Io(_))));
    }
}

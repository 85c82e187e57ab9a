//! Column naming and preparation settings
//!
//! The sampler reads fixed column names (`response`, `subj_idx`, `rt`), while the
//! experiment software writes its own (`correcta`, `id`). [`ColumnMap`] names the
//! source columns; the canonical names are constants.

use crate::error::PrepError;
use serde::{Deserialize, Serialize};

/// Canonical name of the outcome column
pub const RESPONSE_COLUMN: &str = "response";

/// Canonical name of the subject column
pub const SUBJECT_COLUMN: &str = "subj_idx";

/// Divisor turning millisecond response times into seconds
pub const DEFAULT_RT_SCALE: f64 = 1000.0;

/// Cell contents read as missing, in addition to blank cells
pub const DEFAULT_NA_VALUES: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Two stimulus columns compared within one trial (e.g. dot count of the blue
/// and the yellow set)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CovariatePair {
    /// Short name used to build derived column names (`num` → `numFW`)
    pub name: String,
    /// First alternative column
    pub first: String,
    /// Second alternative column
    pub second: String,
}

impl CovariatePair {
    pub fn new(name: &str, first: &str, second: &str) -> Self {
        Self {
            name: name.to_string(),
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    /// Pair with the `AZ`/`AM` suffix convention of the experiment files
    pub fn az_am(name: &str) -> Self {
        Self::new(name, &format!("{name}AZ"), &format!("{name}AM"))
    }

    /// Weber-fraction column name
    pub fn fraction_column(&self) -> String {
        format!("{}FW", self.name)
    }

    pub fn min_column(&self) -> String {
        format!("{}_min_value", self.name)
    }

    pub fn max_column(&self) -> String {
        format!("{}_max_value", self.name)
    }
}

/// Source column names of a trial table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    /// Outcome flag, renamed to `response`
    pub outcome: String,
    /// Subject identifier, renamed to `subj_idx`
    pub subject: String,
    /// Response time column (name kept)
    pub rt: String,
    /// Stimulus covariate pairs
    pub pairs: Vec<CovariatePair>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            outcome: "correcta".to_string(),
            subject: "id".to_string(),
            rt: "rt".to_string(),
            pairs: vec![
                CovariatePair::az_am("num"),
                CovariatePair::az_am("pix"),
                CovariatePair::az_am("env"),
            ],
        }
    }
}

impl ColumnMap {
    /// Columns written by the derivation stage, in output order
    pub fn derived_columns(&self) -> Vec<String> {
        self.pairs
            .iter()
            .flat_map(|p| [p.min_column(), p.max_column(), p.fraction_column()])
            .collect()
    }

    pub fn is_derived(&self, column: &str) -> bool {
        self.pairs.iter().any(|p| {
            column == p.fraction_column() || column == p.min_column() || column == p.max_column()
        })
    }

    /// Covariate columns of every pair, in pair order
    pub fn covariate_columns(&self) -> Vec<&str> {
        self.pairs
            .iter()
            .flat_map(|p| [p.first.as_str(), p.second.as_str()])
            .collect()
    }

    fn validate(&self) -> Result<(), PrepError> {
        let mut seen = std::collections::HashSet::new();
        let names = [self.outcome.as_str(), self.subject.as_str(), self.rt.as_str()];
        for name in names.into_iter().chain(self.covariate_columns()) {
            if name.trim().is_empty() {
                return Err(PrepError::InvalidConfig("column names must not be empty".into()));
            }
            if !seen.insert(name) {
                return Err(PrepError::InvalidConfig(format!(
                    "column {name:?} is mapped twice"
                )));
            }
        }
        let mut pair_names = std::collections::HashSet::new();
        for pair in &self.pairs {
            if pair.name.is_empty() || !pair_names.insert(pair.name.as_str()) {
                return Err(PrepError::InvalidConfig(format!(
                    "covariate pair name {:?} is empty or repeated",
                    pair.name
                )));
            }
        }
        Ok(())
    }
}

/// Preparation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    pub columns: ColumnMap,
    /// Response times are divided by this value
    pub rt_scale: f64,
    /// Field delimiter (single ASCII character)
    pub delimiter: char,
    /// Extra cell contents treated as missing
    pub extra_na_values: Vec<String>,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMap::default(),
            rt_scale: DEFAULT_RT_SCALE,
            delimiter: ',',
            extra_na_values: Vec::new(),
        }
    }
}

impl PrepConfig {
    /// Load settings from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, PrepError> {
        let config: PrepConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PrepError> {
        if !self.rt_scale.is_finite() || self.rt_scale <= 0.0 {
            return Err(PrepError::InvalidConfig(format!(
                "rt_scale must be positive, got {}",
                self.rt_scale
            )));
        }
        self.delimiter_byte()?;
        self.columns.validate()
    }

    pub fn delimiter_byte(&self) -> Result<u8, PrepError> {
        if self.delimiter.is_ascii() && self.delimiter != '"' && self.delimiter != '\n' {
            Ok(self.delimiter as u8)
        } else {
            Err(PrepError::InvalidConfig(format!(
                "delimiter {:?} is not usable",
                self.delimiter
            )))
        }
    }

    /// Whether a cell counts as missing
    pub fn is_na(&self, cell: &str) -> bool {
        let cell = cell.trim();
        cell.is_empty()
            || DEFAULT_NA_VALUES.contains(&cell)
            || self.extra_na_values.iter().any(|v| v == cell)
    }
}

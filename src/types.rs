//! Core types for the preparation pipeline
//!
//! This module defines the data structures that flow through each stage:
//! cleaned trials (typed, renamed) and prepared trials (with Weber fractions).

use crate::schema::{ColumnMap, CovariatePair, TableForm, RESPONSE_COLUMN, SUBJECT_COLUMN};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A trial after null removal, renaming and type coercion
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTrial {
    /// 1-based data row in the source file
    pub source_row: usize,
    pub subj_idx: String,
    pub response: i64,
    /// Response time in seconds
    pub rt: f64,
    /// Covariate cells per pair, still as text
    pub covariates: Vec<[String; 2]>,
    /// Passthrough cells, aligned with the table's passthrough columns
    pub passthrough: Vec<String>,
}

/// Output of the cleaning stage
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTable {
    pub columns: ColumnMap,
    /// Field delimiter of the source, reused on export
    pub delimiter: u8,
    pub passthrough_columns: Vec<String>,
    pub trials: Vec<CleanedTrial>,
    pub report: PrepReport,
}

/// Values of one covariate pair in one trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairValues {
    pub first: f64,
    pub second: f64,
    pub min: f64,
    pub max: f64,
    /// Weber fraction, `min / max`
    pub fraction: f64,
}

/// A trial ready for the sampler
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTrial {
    pub source_row: usize,
    pub subj_idx: String,
    pub response: i64,
    /// Response time in seconds
    pub rt: f64,
    /// One entry per covariate pair, in [`ColumnMap::pairs`] order
    pub pairs: Vec<PairValues>,
    pub passthrough: Vec<String>,
}

/// Counts describing one preparation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepReport {
    pub form: TableForm,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub rows_kept: usize,
    pub passthrough_columns: Vec<String>,
}

/// Cleaned model input table
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTable {
    pub columns: ColumnMap,
    pub delimiter: u8,
    pub passthrough_columns: Vec<String>,
    pub trials: Vec<PreparedTrial>,
    pub report: PrepReport,
}

impl PreparedTable {
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Distinct subject identifiers
    pub fn subjects(&self) -> BTreeSet<&str> {
        self.trials.iter().map(|t| t.subj_idx.as_str()).collect()
    }

    /// Column names in export order
    pub fn header(&self) -> Vec<String> {
        let mut header = vec![
            SUBJECT_COLUMN.to_string(),
            RESPONSE_COLUMN.to_string(),
            self.columns.rt.clone(),
        ];
        header.extend(self.columns.covariate_columns().into_iter().map(str::to_string));
        header.extend(self.passthrough_columns.iter().cloned());
        header.extend(self.columns.derived_columns());
        header
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.header().iter().any(|h| h == name)
    }

    /// Values of a column as numbers; `None` when the column is absent or a
    /// passthrough column holds non-numeric text
    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        if name == RESPONSE_COLUMN {
            return Some(self.trials.iter().map(|t| t.response as f64).collect());
        }
        if name == self.columns.rt {
            return Some(self.trials.iter().map(|t| t.rt).collect());
        }
        for (i, pair) in self.columns.pairs.iter().enumerate() {
            if pair_owns(pair, name) {
                return self
                    .trials
                    .iter()
                    .map(|t| pair_value(pair, name, &t.pairs[i]))
                    .collect();
            }
        }
        let idx = self.passthrough_columns.iter().position(|c| c == name)?;
        self.trials
            .iter()
            .map(|t| t.passthrough[idx].trim().parse::<f64>().ok())
            .collect()
    }

    /// Values of a column as text, in export formatting
    pub fn text_column(&self, name: &str) -> Option<Vec<String>> {
        if name == SUBJECT_COLUMN {
            return Some(self.trials.iter().map(|t| t.subj_idx.clone()).collect());
        }
        if let Some(idx) = self.passthrough_columns.iter().position(|c| c == name) {
            return Some(self.trials.iter().map(|t| t.passthrough[idx].clone()).collect());
        }
        self.numeric_column(name)
            .map(|values| values.into_iter().map(|v| v.to_string()).collect())
    }

    /// Weber fractions of the named pair (`num`, `pix`, `env`)
    pub fn fractions(&self, pair: &str) -> Option<Vec<f64>> {
        let idx = self.columns.pairs.iter().position(|p| p.name == pair)?;
        Some(self.trials.iter().map(|t| t.pairs[idx].fraction).collect())
    }
}

fn pair_owns(pair: &CovariatePair, name: &str) -> bool {
    name == pair.first
        || name == pair.second
        || name == pair.min_column()
        || name == pair.max_column()
        || name == pair.fraction_column()
}

fn pair_value(pair: &CovariatePair, name: &str, values: &PairValues) -> Option<f64> {
    if name == pair.first {
        Some(values.first)
    } else if name == pair.second {
        Some(values.second)
    } else if name == pair.min_column() {
        Some(values.min)
    } else if name == pair.max_column() {
        Some(values.max)
    } else if name == pair.fraction_column() {
        Some(values.fraction)
    } else {
        None
    }
}

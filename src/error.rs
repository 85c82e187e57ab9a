//! Error types for weber-ddm

use thiserror::Error;

/// Errors that can occur while preparing trials, describing a model or
/// reading posterior output
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed delimited input: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Column {0} would appear twice in the prepared table")]
    DuplicateColumn(String),

    #[error("Row {row} has {found} fields, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Row {row}: cannot convert {column}={value:?} to {target}")]
    TypeConversion {
        row: usize,
        column: String,
        value: String,
        target: &'static str,
    },

    #[error("Row {row}: covariate {column}={value:?} is not numeric")]
    NonNumericCovariate {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row {row}: covariate {column}={value} must be finite and non-negative")]
    InvalidCovariate { row: usize, column: String, value: f64 },

    #[error("Row {row}: Weber fraction {pair} is undefined, both paired values are zero")]
    ZeroDenominator { row: usize, pair: String },

    #[error("Invalid regression formula {formula:?}: {reason}")]
    InvalidFormula { formula: String, reason: String },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Trace for {0} has no samples")]
    EmptyTrace(String),

    #[error("Histogram needs at least one bin")]
    InvalidBins,

    #[error("No trials left after cleaning")]
    EmptyTable,
}

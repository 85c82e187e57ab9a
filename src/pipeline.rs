//! Pipeline orchestration
//!
//! This module provides the public preparation API. It runs the full pipeline
//! from delimited text to a [`PreparedTable`].

use crate::cleaner::Cleaner;
use crate::error::PrepError;
use crate::features::FeatureDeriver;
use crate::schema::{PrepConfig, RawTable};
use crate::types::PreparedTable;
use log::info;
use std::io::Read;
use std::path::Path;

/// Prepare a trial table given as delimited text.
///
/// # Example
/// ```
/// use weber_ddm::{prepare_csv, PrepConfig};
///
/// let csv = "id,correcta,rt,numAZ,numAM,pixAZ,pixAM,envAZ,envAM\n\
///            S01,1,850,4,8,10,10,0,5\n";
/// let table = prepare_csv(csv, &PrepConfig::default()).unwrap();
/// assert_eq!(table.trials[0].rt, 0.85);
/// assert_eq!(table.fractions("num"), Some(vec![0.5]));
/// ```
pub fn prepare_csv(text: &str, config: &PrepConfig) -> Result<PreparedTable, PrepError> {
    Preparer::with_config(config.clone())?.prepare_str(text)
}

/// Prepare a trial table stored in a file
pub fn prepare_path(
    path: impl AsRef<Path>,
    config: &PrepConfig,
) -> Result<PreparedTable, PrepError> {
    let preparer = Preparer::with_config(config.clone())?;
    let raw = RawTable::from_path(path, preparer.config())?;
    preparer.prepare(&raw)
}

/// Preparation pipeline with fixed settings.
///
/// Pipeline stages:
/// 1. RawTable - Parse delimited text
/// 2. Cleaner - Drop null rows, rename, coerce types, rescale rt
/// 3. FeatureDeriver - Compute Weber fractions
pub struct Preparer {
    config: PrepConfig,
}

impl Default for Preparer {
    fn default() -> Self {
        Self::new()
    }
}

impl Preparer {
    /// Create a preparer with the default column layout
    pub fn new() -> Self {
        Self {
            config: PrepConfig::default(),
        }
    }

    /// Create a preparer with custom settings
    pub fn with_config(config: PrepConfig) -> Result<Self, PrepError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PrepConfig {
        &self.config
    }

    /// Run cleaning and derivation on a parsed table
    pub fn prepare(&self, raw: &RawTable) -> Result<PreparedTable, PrepError> {
        let cleaned = Cleaner::new(&self.config).clean(raw)?;
        let prepared = FeatureDeriver::derive(cleaned)?;

        info!(
            "prepared {} trials from {} subjects ({} rows dropped)",
            prepared.len(),
            prepared.subjects().len(),
            prepared.report.rows_dropped
        );
        Ok(prepared)
    }

    pub fn prepare_str(&self, text: &str) -> Result<PreparedTable, PrepError> {
        let raw = RawTable::from_csv_str(text, &self.config)?;
        self.prepare(&raw)
    }

    pub fn prepare_reader<R: Read>(&self, reader: R) -> Result<PreparedTable, PrepError> {
        let raw = RawTable::from_reader(reader, self.config.delimiter_byte()?)?;
        self.prepare(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{TableForm, RESPONSE_COLUMN, SUBJECT_COLUMN};
    use pretty_assertions::assert_eq;

    fn sample_csv() -> &'static str {
        "id,correcta,rt,numAZ,numAM,pixAZ,pixAM,envAZ,envAM,time\n\
         S01,1,850.0,4,8,10,10,0,5,100\n\
         S01,0,1210,9,12,40,36,2,6,200\n\
         S02,1,640,,7,15,20,4,4,100\n\
         S02,1,705,3,7,15,20,4,4,400\n"
    }

    #[test]
    fn test_reference_trial() {
        let table = prepare_csv(sample_csv(), &PrepConfig::default()).unwrap();
        let trial = &table.trials[0];

        assert_eq!(trial.subj_idx, "S01");
        assert_eq!(trial.response, 1);
        assert_eq!(trial.rt, 0.85);
        assert_eq!(trial.pairs[0].fraction, 0.5);
        assert_eq!(trial.pairs[1].fraction, 1.0);
        assert_eq!(trial.pairs[2].fraction, 0.0);
    }

    #[test]
    fn test_report_counts() {
        let table = prepare_csv(sample_csv(), &PrepConfig::default()).unwrap();

        assert_eq!(table.report.form, TableForm::Raw);
        assert_eq!(table.report.rows_read, 4);
        assert_eq!(table.report.rows_dropped, 1);
        assert_eq!(table.len(), 3);
        assert_eq!(table.subjects().into_iter().collect::<Vec<_>>(), vec!["S01", "S02"]);
    }

    #[test]
    fn test_rt_is_input_over_scale() {
        let table = prepare_csv(sample_csv(), &PrepConfig::default()).unwrap();
        let rts = table.numeric_column("rt").unwrap();
        assert_eq!(rts, vec![850.0 / 1000.0, 1210.0 / 1000.0, 705.0 / 1000.0]);
    }

    #[test]
    fn test_preparing_prepared_output_is_stable() {
        let config = PrepConfig::default();
        let first = prepare_csv(sample_csv(), &config).unwrap();
        let exported = first.to_csv_string().unwrap();

        let second = prepare_csv(&exported, &config).unwrap();
        assert_eq!(second.report.form, TableForm::Canonical);
        assert_eq!(second.passthrough_columns, first.passthrough_columns);
        for (a, b) in first.trials.iter().zip(&second.trials) {
            assert_eq!(a.subj_idx, b.subj_idx);
            assert_eq!(a.response, b.response);
            assert_eq!(a.rt, b.rt);
            assert_eq!(a.pairs, b.pairs);
            assert_eq!(a.passthrough, b.passthrough);
        }
        assert_eq!(second.to_csv_string().unwrap(), exported);
    }

    #[test]
    fn test_canonical_columns_present() {
        let table = prepare_csv(sample_csv(), &PrepConfig::default()).unwrap();
        assert!(table.has_column(RESPONSE_COLUMN));
        assert!(table.has_column(SUBJECT_COLUMN));
        assert!(table.has_column("envFW"));
        assert!(!table.has_column("correcta"));
    }

    #[test]
    fn test_custom_rt_scale() {
        let config = PrepConfig {
            rt_scale: 1.0,
            ..Default::default()
        };
        let table = prepare_csv(sample_csv(), &config).unwrap();
        assert_eq!(table.trials[0].rt, 850.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PrepConfig {
            delimiter: 'é',
            ..Default::default()
        };
        assert!(Preparer::with_config(config).is_err());
    }
}

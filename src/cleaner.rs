//! Trial cleaning
//!
//! This module turns a raw text table into typed trials:
//! - Rows with any missing cell are dropped whole
//! - Outcome and subject columns are renamed to `response` / `subj_idx`
//! - `response` is coerced to an integer, `rt` to seconds
//!
//! Covariate cells stay as text; they are parsed when the Weber fractions are
//! derived.

use crate::error::PrepError;
use crate::schema::{PrepConfig, RawTable, TableForm, RESPONSE_COLUMN, SUBJECT_COLUMN};
use crate::types::{CleanedTable, CleanedTrial, PrepReport};
use log::{debug, warn};

/// Cleaner for converting a raw table into typed trials
pub struct Cleaner<'a> {
    config: &'a PrepConfig,
}

impl<'a> Cleaner<'a> {
    pub fn new(config: &'a PrepConfig) -> Self {
        Self { config }
    }

    /// Clean a raw table
    pub fn clean(&self, raw: &RawTable) -> Result<CleanedTable, PrepError> {
        let columns = &self.config.columns;
        let form = raw.form(columns);

        // Header problems fail before any row is read
        if let Some(missing) = raw.missing_columns(columns).into_iter().next() {
            return Err(PrepError::MissingColumn(missing));
        }

        let (outcome_name, subject_name) = match form {
            TableForm::Raw => (columns.outcome.as_str(), columns.subject.as_str()),
            TableForm::Canonical => (RESPONSE_COLUMN, SUBJECT_COLUMN),
        };
        let outcome_idx = raw.require(outcome_name)?;
        let subject_idx = raw.require(subject_name)?;
        let rt_idx = raw.require(&columns.rt)?;
        let pair_idx = columns
            .pairs
            .iter()
            .map(|p| Ok((raw.require(&p.first)?, raw.require(&p.second)?)))
            .collect::<Result<Vec<_>, PrepError>>()?;

        let mut used = vec![outcome_idx, subject_idx, rt_idx];
        used.extend(pair_idx.iter().flat_map(|&(a, b)| [a, b]));

        // Derived columns of an earlier run are recomputed, not carried
        let passthrough_idx: Vec<usize> = (0..raw.headers().len())
            .filter(|i| !used.contains(i) && !columns.is_derived(&raw.headers()[*i]))
            .collect();
        let passthrough_columns: Vec<String> = passthrough_idx
            .iter()
            .map(|&i| raw.headers()[i].clone())
            .collect();

        // A stray `response` next to `correcta` would be emitted twice
        let mut output_names = vec![RESPONSE_COLUMN, SUBJECT_COLUMN, columns.rt.as_str()];
        output_names.extend(columns.covariate_columns());
        if let Some(dup) = passthrough_columns
            .iter()
            .find(|name| output_names.contains(&name.as_str()))
        {
            return Err(PrepError::DuplicateColumn(dup.clone()));
        }

        // A prepared table already holds seconds
        let rt_scale = match form {
            TableForm::Raw => self.config.rt_scale,
            TableForm::Canonical => 1.0,
        };

        let mut trials = Vec::with_capacity(raw.len());
        let mut rows_dropped = 0;

        for (i, row) in raw.rows().iter().enumerate() {
            let source_row = i + 1;

            if row.iter().any(|cell| self.config.is_na(cell)) {
                rows_dropped += 1;
                continue;
            }

            let response = coerce_integer(&row[outcome_idx]).ok_or_else(|| {
                PrepError::TypeConversion {
                    row: source_row,
                    column: RESPONSE_COLUMN.to_string(),
                    value: row[outcome_idx].clone(),
                    target: "integer",
                }
            })?;

            let rt = row[rt_idx].trim().parse::<f64>().map_err(|_| {
                PrepError::TypeConversion {
                    row: source_row,
                    column: columns.rt.clone(),
                    value: row[rt_idx].clone(),
                    target: "float",
                }
            })? / rt_scale;

            trials.push(CleanedTrial {
                source_row,
                subj_idx: row[subject_idx].trim().to_string(),
                response,
                rt,
                covariates: pair_idx
                    .iter()
                    .map(|&(a, b)| [row[a].clone(), row[b].clone()])
                    .collect(),
                passthrough: passthrough_idx.iter().map(|&i| row[i].clone()).collect(),
            });
        }

        if rows_dropped > 0 {
            warn!(
                "dropped {} of {} rows with missing cells",
                rows_dropped,
                raw.len()
            );
        }
        debug!(
            "cleaned {} rows ({:?} form, passthrough columns {:?})",
            trials.len(),
            form,
            passthrough_columns
        );

        let report = PrepReport {
            form,
            rows_read: raw.len(),
            rows_dropped,
            rows_kept: trials.len(),
            passthrough_columns: passthrough_columns.clone(),
        };

        Ok(CleanedTable {
            columns: columns.clone(),
            delimiter: self.config.delimiter_byte()?,
            passthrough_columns,
            trials,
            report,
        })
    }
}

/// Parse an integral cell; `1` and `1.0` are accepted, `1.5` is not
fn coerce_integer(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    if let Ok(value) = cell.parse::<i64>() {
        return Some(value);
    }
    let value = cell.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

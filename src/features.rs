//! Feature derivation
//!
//! This module derives the Weber fraction of every covariate pair: the smaller
//! of the two compared stimulus values divided by the larger one. A fraction
//! near 1 marks a hard discrimination, near 0 an easy one.

use crate::error::PrepError;
use crate::types::{CleanedTable, PairValues, PreparedTable, PreparedTrial};
use log::debug;

/// Feature deriver for computing Weber fractions
pub struct FeatureDeriver;

impl FeatureDeriver {
    /// Derive Weber fractions for every trial of a cleaned table
    pub fn derive(cleaned: CleanedTable) -> Result<PreparedTable, PrepError> {
        let CleanedTable {
            columns,
            delimiter,
            passthrough_columns,
            trials,
            report,
        } = cleaned;

        let mut prepared = Vec::with_capacity(trials.len());
        for trial in trials {
            let pairs = columns
                .pairs
                .iter()
                .zip(&trial.covariates)
                .map(|(pair, [first, second])| {
                    let first = parse_covariate(trial.source_row, &pair.first, first)?;
                    let second = parse_covariate(trial.source_row, &pair.second, second)?;
                    compute_pair(first, second).ok_or_else(|| PrepError::ZeroDenominator {
                        row: trial.source_row,
                        pair: pair.fraction_column(),
                    })
                })
                .collect::<Result<Vec<_>, PrepError>>()?;

            prepared.push(PreparedTrial {
                source_row: trial.source_row,
                subj_idx: trial.subj_idx,
                response: trial.response,
                rt: trial.rt,
                pairs,
                passthrough: trial.passthrough,
            });
        }

        debug!(
            "derived {} Weber fractions for {} trials",
            columns.pairs.len(),
            prepared.len()
        );

        Ok(PreparedTable {
            columns,
            delimiter,
            passthrough_columns,
            trials: prepared,
            report,
        })
    }
}

/// Smaller over larger of two non-negative values; `None` when both are zero
pub fn weber_fraction(a: f64, b: f64) -> Option<f64> {
    compute_pair(a, b).map(|p| p.fraction)
}

fn compute_pair(first: f64, second: f64) -> Option<PairValues> {
    let min = first.min(second);
    let max = first.max(second);
    if max == 0.0 {
        return None;
    }
    Some(PairValues {
        first,
        second,
        min,
        max,
        fraction: min / max,
    })
}

fn parse_covariate(row: usize, column: &str, cell: &str) -> Result<f64, PrepError> {
    let value = cell
        .trim()
        .parse::<f64>()
        .map_err(|_| PrepError::NonNumericCovariate {
            row,
            column: column.to_string(),
            value: cell.to_string(),
        })?;

    if !value.is_finite() || value < 0.0 {
        return Err(PrepError::InvalidCovariate {
            row,
            column: column.to_string(),
            value,
        });
    }
    Ok(value)
}

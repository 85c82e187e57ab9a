//! Posterior sample traces
//!
//! One column per model node, one row per retained MCMC sample.

use crate::error::PrepError;
use crate::posterior::histogram::Histogram;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Posterior samples keyed by node name
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TraceStore {
    traces: BTreeMap<String, Vec<f64>>,
}

impl TraceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the samples of one node
    pub fn insert(&mut self, name: &str, samples: Vec<f64>) {
        self.traces.insert(name.to_string(), samples);
    }

    /// Load traces from delimited text. Blank cells are skipped, so nodes may
    /// have different numbers of samples.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PrepError> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
        for (i, record) in csv_reader.records().enumerate() {
            let record = record?;
            for (col, cell) in record.iter().enumerate() {
                let cell = cell.trim();
                if cell.is_empty() {
                    continue;
                }
                let value = cell.parse::<f64>().map_err(|_| PrepError::TypeConversion {
                    row: i + 1,
                    column: headers[col].clone(),
                    value: cell.to_string(),
                    target: "float",
                })?;
                columns[col].push(value);
            }
        }

        Ok(Self {
            traces: headers.into_iter().zip(columns).collect(),
        })
    }

    pub fn from_csv_str(text: &str) -> Result<Self, PrepError> {
        Self::from_reader(text.as_bytes())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PrepError> {
        Self::from_reader(File::open(path.as_ref())?)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.traces.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.traces.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Samples of one node
    pub fn trace(&self, name: &str) -> Result<&[f64], PrepError> {
        self.traces
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| PrepError::UnknownParameter(name.to_string()))
    }

    /// Sample mean of one node
    pub fn mean(&self, name: &str) -> Result<f64, PrepError> {
        let samples = self.trace(name)?;
        if samples.is_empty() {
            return Err(PrepError::EmptyTrace(name.to_string()));
        }
        Ok(samples.iter().sum::<f64>() / samples.len() as f64)
    }

    /// Histogram of one node's samples
    pub fn histogram(
        &self,
        name: &str,
        bins: usize,
        density: bool,
    ) -> Result<Histogram, PrepError> {
        Histogram::of(name, self.trace(name)?, bins, density)
    }
}

//! Posterior summary statistics
//!
//! The sampler writes one row per model node: the node name first, then
//! `mean`, `std`, quantiles and Monte-Carlo error. Only `mean` is required.

use crate::error::PrepError;
use crate::model::DdmParameter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Column holding the posterior mean
pub const MEAN_COLUMN: &str = "mean";

/// Selects model nodes by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "lowercase")]
pub enum NameFilter {
    /// Name starts with the pattern
    Prefix(String),
    /// Name contains the pattern anywhere
    Contains(String),
    /// Name equals the pattern
    Exact(String),
}

impl NameFilter {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameFilter::Prefix(p) => name.starts_with(p.as_str()),
            NameFilter::Contains(p) => name.contains(p.as_str()),
            NameFilter::Exact(p) => name == p,
        }
    }

    /// Every node of a parameter: group mean, spread, subject nodes, coefficients
    pub fn parameter(parameter: DdmParameter) -> Self {
        NameFilter::Prefix(parameter.as_str().to_string())
    }

    /// Subject nodes of a stratified parameter at one condition level,
    /// e.g. `v_subj(100).S01`
    pub fn subject_condition(parameter: DdmParameter, level: &str) -> Self {
        NameFilter::Prefix(format!("{parameter}_subj({level})"))
    }

    pub fn pattern(&self) -> &str {
        match self {
            NameFilter::Prefix(p) | NameFilter::Contains(p) | NameFilter::Exact(p) => p,
        }
    }
}

/// One model node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRow {
    pub name: String,
    pub mean: f64,
    /// Remaining numeric columns by header name
    pub values: BTreeMap<String, f64>,
}

/// Posterior means of the nodes selected by a filter, the data of one bar chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl BarSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Summary statistics table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryStats {
    columns: Vec<String>,
    rows: Vec<StatsRow>,
}

impl SummaryStats {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PrepError> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mean_idx = headers
            .iter()
            .skip(1)
            .position(|h| h == MEAN_COLUMN)
            .map(|i| i + 1)
            .ok_or_else(|| PrepError::MissingColumn(MEAN_COLUMN.to_string()))?;

        let mut rows = Vec::new();
        for (i, record) in csv_reader.records().enumerate() {
            let record = record?;
            let row_no = i + 1;

            let mut values = BTreeMap::new();
            for (col, cell) in record.iter().enumerate().skip(1) {
                let cell = cell.trim();
                if cell.is_empty() {
                    continue;
                }
                let value = cell.parse::<f64>().map_err(|_| PrepError::TypeConversion {
                    row: row_no,
                    column: headers[col].clone(),
                    value: cell.to_string(),
                    target: "float",
                })?;
                values.insert(headers[col].clone(), value);
            }

            let mean = values
                .remove(MEAN_COLUMN)
                .ok_or_else(|| PrepError::TypeConversion {
                    row: row_no,
                    column: MEAN_COLUMN.to_string(),
                    value: record.get(mean_idx).unwrap_or_default().to_string(),
                    target: "float",
                })?;

            rows.push(StatsRow {
                name: record.get(0).unwrap_or_default().trim().to_string(),
                mean,
                values,
            });
        }

        Ok(Self {
            columns: headers.into_iter().skip(1).collect(),
            rows,
        })
    }

    pub fn from_csv_str(text: &str) -> Result<Self, PrepError> {
        Self::from_reader(text.as_bytes())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PrepError> {
        Self::from_reader(File::open(path.as_ref())?)
    }

    /// Statistic columns (everything after the name column)
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[StatsRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&StatsRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn mean(&self, name: &str) -> Result<f64, PrepError> {
        self.get(name)
            .map(|r| r.mean)
            .ok_or_else(|| PrepError::UnknownParameter(name.to_string()))
    }

    /// Rows selected by a filter, in table order
    pub fn filter(&self, filter: &NameFilter) -> Vec<&StatsRow> {
        self.rows.iter().filter(|r| filter.matches(&r.name)).collect()
    }

    /// Posterior means of the selected rows, labels reduced to ASCII
    pub fn bar_series(&self, filter: &NameFilter, title: &str) -> BarSeries {
        let rows = self.filter(filter);
        BarSeries {
            title: title.to_string(),
            labels: rows.iter().map(|r| ascii_label(&r.name)).collect(),
            values: rows.iter().map(|r| r.mean).collect(),
        }
    }
}

/// Drop every non-ASCII character from a node name
pub fn ascii_label(name: &str) -> String {
    name.chars().filter(char::is_ascii).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STATS: &str = ",mean,std,2.5q,25q,50q,75q,97.5q,mc err\n\
        a,1.52,0.08,1.37,1.47,1.52,1.57,1.68,0.002\n\
        a_std,0.31,0.06,0.21,0.27,0.30,0.34,0.45,0.001\n\
        a_subj.S01,1.41,0.05,1.31,1.38,1.41,1.44,1.51,0.001\n\
        v_Intercept,0.92,0.21,0.50,0.78,0.92,1.06,1.33,0.005\n\
        v_numFW,-1.10,0.30,-1.69,-1.30,-1.10,-0.90,-0.51,0.007\n\
        v_subj(100).S01,0.75,0.12,0.52,0.67,0.75,0.83,0.98,0.003\n\
        v_subj(200).S01,0.81,0.13,0.56,0.72,0.81,0.90,1.06,0.003\n\
        t,0.28,0.02,0.24,0.27,0.28,0.29,0.32,\n";

    #[test]
    fn test_load_stats() {
        let stats = SummaryStats::from_csv_str(STATS).unwrap();
        assert_eq!(stats.len(), 8);
        assert_eq!(stats.columns()[0], "mean");
        assert_eq!(stats.mean("a").unwrap(), 1.52);

        let t = stats.get("t").unwrap();
        assert_eq!(t.values.get("std"), Some(&0.02));
        assert!(!t.values.contains_key("mc err"));
        assert!(matches!(stats.mean("z"), Err(PrepError::UnknownParameter(_))));
    }

    #[test]
    fn test_missing_mean_column() {
        let result = SummaryStats::from_csv_str(",std\na,0.1\n");
        assert!(matches!(result, Err(PrepError::MissingColumn(c)) if c == "mean"));
    }

    #[test]
    fn test_prefix_filters() {
        let stats = SummaryStats::from_csv_str(STATS).unwrap();

        let a: Vec<&str> = stats
            .filter(&NameFilter::parameter(DdmParameter::A))
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(a, vec!["a", "a_std", "a_subj.S01"]);

        let level = stats.bar_series(
            &NameFilter::subject_condition(DdmParameter::V, "100"),
            "v at 100 ms",
        );
        assert_eq!(level.labels, vec!["v_subj(100).S01"]);
        assert_eq!(level.values, vec![0.75]);
    }

    #[test]
    fn test_contains_and_exact() {
        let stats = SummaryStats::from_csv_str(STATS).unwrap();
        assert_eq!(stats.filter(&NameFilter::Contains("S01".into())).len(), 3);
        assert_eq!(stats.filter(&NameFilter::Exact("v_numFW".into())).len(), 1);
    }

    #[test]
    fn test_ascii_labels() {
        assert_eq!(ascii_label("v_subj(100).José"), "v_subj(100).Jos");
        assert_eq!(ascii_label("a_std"), "a_std");
    }

    #[test]
    fn test_filter_serde() {
        let filter = NameFilter::Prefix("v".into());
        let json = serde_json::to_string(&filter).unwrap();
        assert_eq!(json, r#"{"kind":"prefix","pattern":"v"}"#);
    }
}

//! Raw trial table as read from delimited text
//!
//! Cells are kept as text; typing happens in the cleaning stage so that a row
//! with a missing cell can be dropped before any conversion is attempted.

use crate::error::PrepError;
use crate::schema::columns::{ColumnMap, PrepConfig, RESPONSE_COLUMN, SUBJECT_COLUMN};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Whether a table still carries the experiment's column names or was already
/// prepared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableForm {
    /// Source names (`correcta`, `id`), response times in milliseconds
    Raw,
    /// Canonical names (`response`, `subj_idx`), response times in seconds
    Canonical,
}

/// Header plus text rows of a delimited file
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from already split rows; every row must match the header width
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, PrepError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(PrepError::RaggedRow {
                    row: i + 1,
                    expected: headers.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { headers, rows })
    }

    /// Parse delimited text from any reader. A header row is required.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, PrepError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let h = h.trim();
                if i == 0 {
                    h.trim_start_matches('\u{feff}').to_string()
                } else {
                    h.to_string()
                }
            })
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        Self::new(headers, rows)
    }

    pub fn from_csv_str(text: &str, config: &PrepConfig) -> Result<Self, PrepError> {
        Self::from_reader(text.as_bytes(), config.delimiter_byte()?)
    }

    pub fn from_path(path: impl AsRef<Path>, config: &PrepConfig) -> Result<Self, PrepError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file, config.delimiter_byte()?)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of a column that must be present
    pub fn require(&self, name: &str) -> Result<usize, PrepError> {
        self.column_index(name)
            .ok_or_else(|| PrepError::MissingColumn(name.to_string()))
    }

    /// Detect whether the header uses source or canonical names
    pub fn form(&self, columns: &ColumnMap) -> TableForm {
        let has = |name: &str| self.column_index(name).is_some();
        if !has(&columns.outcome)
            && !has(&columns.subject)
            && has(RESPONSE_COLUMN)
            && has(SUBJECT_COLUMN)
        {
            TableForm::Canonical
        } else {
            TableForm::Raw
        }
    }

    /// Required columns absent from the header, for the given form
    pub fn missing_columns(&self, columns: &ColumnMap) -> Vec<String> {
        let (outcome, subject) = match self.form(columns) {
            TableForm::Raw => (columns.outcome.as_str(), columns.subject.as_str()),
            TableForm::Canonical => (RESPONSE_COLUMN, SUBJECT_COLUMN),
        };
        [outcome, subject, columns.rt.as_str()]
            .into_iter()
            .chain(columns.covariate_columns())
            .filter(|name| self.column_index(name).is_none())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "id,correcta,rt,numAZ,numAM,pixAZ,pixAM,envAZ,envAM,time\n\
                       S01,1,850,4,8,10,10,0,5,100\n\
                       S02,0,1200,6,9,20,30,3,4,200\n";

    #[test]
    fn test_parse_headers_and_rows() {
        let table = RawTable::from_csv_str(RAW, &PrepConfig::default()).unwrap();
        assert_eq!(table.headers().len(), 10);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1][0], "S02");
        assert_eq!(table.column_index("time"), Some(9));
    }

    #[test]
    fn test_detect_form() {
        let columns = ColumnMap::default();
        let raw = RawTable::from_csv_str(RAW, &PrepConfig::default()).unwrap();
        assert_eq!(raw.form(&columns), TableForm::Raw);

        let canonical = RawTable::from_csv_str(
            "subj_idx,response,rt,numAZ,numAM,pixAZ,pixAM,envAZ,envAM\n",
            &PrepConfig::default(),
        )
        .unwrap();
        assert_eq!(canonical.form(&columns), TableForm::Canonical);
        assert!(canonical.missing_columns(&columns).is_empty());
    }

    #[test]
    fn test_missing_columns_listed() {
        let table =
            RawTable::from_csv_str("id,correcta,rt,numAZ\n", &PrepConfig::default()).unwrap();
        let missing = table.missing_columns(&ColumnMap::default());
        assert_eq!(missing, vec!["numAM", "pixAZ", "pixAM", "envAZ", "envAM"]);
    }

    #[test]
    fn test_ragged_row_rejected() {
        let result = RawTable::from_csv_str("a,b\n1,2\n3\n", &PrepConfig::default());
        assert!(matches!(
            result,
            Err(PrepError::RaggedRow { row: 2, expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_semicolon_delimiter_and_bom() {
        let config = PrepConfig {
            delimiter: ';',
            ..Default::default()
        };
        let table = RawTable::from_csv_str("\u{feff}id;rt\nS01;900\n", &config).unwrap();
        assert_eq!(table.headers(), &["id".to_string(), "rt".to_string()]);
        assert_eq!(table.rows()[0][1], "900");
    }
}

//! Prepared table export
//!
//! Writes a [`PreparedTable`] as delimited text with canonical column names,
//! the file the external sampler loads. Numbers use the shortest form that
//! reads back to the same value, so preparing an exported table reproduces it.

use crate::error::PrepError;
use crate::types::{PreparedTable, PreparedTrial};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writer for prepared tables
pub struct TableWriter {
    delimiter: u8,
}

impl Default for TableWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TableWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Write the table to any writer
    pub fn write<W: Write>(&self, table: &PreparedTable, writer: W) -> Result<(), PrepError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);

        csv_writer.write_record(table.header())?;
        for trial in &table.trials {
            csv_writer.write_record(row(trial))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_string(&self, table: &PreparedTable) -> Result<String, PrepError> {
        let mut buffer = Vec::new();
        self.write(table, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| PrepError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    pub fn write_path(
        &self,
        table: &PreparedTable,
        path: impl AsRef<Path>,
    ) -> Result<(), PrepError> {
        let file = File::create(path.as_ref())?;
        self.write(table, file)
    }
}

/// Fields of one trial in [`PreparedTable::header`] order
fn row(trial: &PreparedTrial) -> Vec<String> {
    let mut fields = vec![
        trial.subj_idx.clone(),
        trial.response.to_string(),
        trial.rt.to_string(),
    ];
    for pair in &trial.pairs {
        fields.push(pair.first.to_string());
        fields.push(pair.second.to_string());
    }
    fields.extend(trial.passthrough.iter().cloned());
    for pair in &trial.pairs {
        fields.push(pair.min.to_string());
        fields.push(pair.max.to_string());
        fields.push(pair.fraction.to_string());
    }
    fields
}

impl PreparedTable {
    /// Export with the delimiter the table was read with
    pub fn to_csv_string(&self) -> Result<String, PrepError> {
        TableWriter::with_delimiter(self.delimiter).write_string(self)
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), PrepError> {
        TableWriter::with_delimiter(self.delimiter).write_path(self, path)
    }
}

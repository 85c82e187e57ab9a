//! Model job encoding
//!
//! A [`ModelJob`] bundles a validated [`ModelSpec`] with a description of the
//! prepared table it refers to. It is written as JSON next to the exported
//! table so the sampler run can be traced back to its input.

use crate::error::PrepError;
use crate::model::parameter::DdmParameter;
use crate::model::spec::{condition_levels, ModelSpec, ModelVariant};
use crate::pipeline::Preparer;
use crate::posterior::NameFilter;
use crate::schema::{ColumnMap, PrepConfig};
use crate::types::PreparedTable;
use crate::{PREP_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File name of the exported table inside a job directory
pub const DATA_FILE_NAME: &str = "data.csv";

/// File name of the job manifest inside a job directory
pub const JOB_FILE_NAME: &str = "job.json";

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProducer {
    pub name: String,
    pub version: String,
}

/// Description of the table handed to the sampler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobData {
    /// Exported table, relative to the manifest
    pub file: String,
    /// Source column layout, needed to read the exported table back
    #[serde(default)]
    pub layout: ColumnMap,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    pub rows: usize,
    pub subjects: usize,
    pub columns: Vec<String>,
    /// Levels of every condition column used by `depends_on`
    #[serde(default)]
    pub condition_levels: BTreeMap<String, Vec<String>>,
}

/// Validated model job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelJob {
    pub job_id: String,
    pub created_at_utc: DateTime<Utc>,
    pub producer: JobProducer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<ModelVariant>,
    pub spec: ModelSpec,
    pub data: JobData,
}

impl ModelJob {
    /// Validate `spec` against `table` and describe the job
    pub fn new(spec: ModelSpec, table: &PreparedTable) -> Result<Self, PrepError> {
        if table.is_empty() {
            return Err(PrepError::EmptyTable);
        }
        spec.validate(table)?;

        let mut levels = BTreeMap::new();
        for column in spec.condition_columns() {
            levels.insert(column.to_string(), condition_levels(table, column)?);
        }

        Ok(Self {
            job_id: Uuid::new_v4().to_string(),
            created_at_utc: Utc::now(),
            producer: JobProducer {
                name: PRODUCER_NAME.to_string(),
                version: PREP_VERSION.to_string(),
            },
            variant: None,
            spec,
            data: JobData {
                file: DATA_FILE_NAME.to_string(),
                layout: table.columns.clone(),
                delimiter: char::from(table.delimiter),
                rows: table.len(),
                subjects: table.subjects().len(),
                columns: table.header(),
                condition_levels: levels,
            },
        })
    }

    /// Job for one of the presets
    pub fn for_variant(variant: ModelVariant, table: &PreparedTable) -> Result<Self, PrepError> {
        let mut job = Self::new(ModelSpec::for_variant(variant), table)?;
        job.variant = Some(variant);
        Ok(job)
    }

    pub fn to_json(&self) -> Result<String, PrepError> {
        serde_json::to_string_pretty(self).map_err(PrepError::JsonError)
    }

    pub fn from_json(json: &str) -> Result<Self, PrepError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Subject-level filters per condition level for a stratified parameter,
    /// e.g. `v_subj(100)`, `v_subj(200)`; empty when the parameter is not
    /// stratified
    pub fn condition_filters(&self, parameter: DdmParameter) -> Vec<(String, NameFilter)> {
        let Some(column) = self.spec.depends_on.get(&parameter) else {
            return Vec::new();
        };
        self.data
            .condition_levels
            .get(column)
            .map(|levels| {
                levels
                    .iter()
                    .map(|level| (level.clone(), NameFilter::subject_condition(parameter, level)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Settings that read the exported table back
    pub fn prep_config(&self) -> PrepConfig {
        PrepConfig {
            columns: self.data.layout.clone(),
            delimiter: self.data.delimiter,
            ..PrepConfig::default()
        }
    }

    /// Prepare the exported table of a bundle in `dir` again
    pub fn read_table(&self, dir: impl AsRef<Path>) -> Result<PreparedTable, PrepError> {
        let text = fs::read_to_string(dir.as_ref().join(&self.data.file))?;
        Preparer::with_config(self.prep_config())?.prepare_str(&text)
    }

    /// Write the exported table and the manifest into `dir`, creating it if
    /// needed. Returns the manifest path.
    pub fn write_bundle(
        &self,
        table: &PreparedTable,
        dir: impl AsRef<Path>,
    ) -> Result<PathBuf, PrepError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        table.write_csv(dir.join(&self.data.file))?;
        let manifest = dir.join(JOB_FILE_NAME);
        fs::write(&manifest, self.to_json()?)?;

        info!(
            "wrote job {} ({} rows, {} subjects) to {}",
            self.job_id,
            self.data.rows,
            self.data.subjects,
            dir.display()
        );
        Ok(manifest)
    }
}

fn default_delimiter() -> char {
    ','
}

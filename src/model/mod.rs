//! Hierarchical model description
//!
//! Everything the external sampler needs besides the prepared table: which
//! DDM parameters are regressed on which covariates, which are estimated per
//! condition, and how long to sample.
//!
//! Pipeline: ModelVariant/JSON → ModelSpec → validate(table) → ModelJob
//! → HierarchicalFitter

pub mod fitter;
pub mod formula;
pub mod job;
pub mod parameter;
pub mod spec;

pub use fitter::{FileFitter, FitOutput, HierarchicalFitter, STATS_FILE_NAME, TRACES_FILE_NAME};
pub use formula::{LinkFunction, Regressor};
pub use job::{JobData, JobProducer, ModelJob, DATA_FILE_NAME, JOB_FILE_NAME};
pub use parameter::DdmParameter;
pub use spec::{condition_levels, ModelSpec, ModelVariant, DEFAULT_CONDITION_COLUMN};

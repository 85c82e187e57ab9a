//! weber-ddm - Trial preparation for hierarchical drift-diffusion models
//!
//! Turns a raw numerosity-comparison trial table into the input a hierarchical
//! DDM sampler expects, through a deterministic pipeline: raw table → cleaning
//! → Weber-fraction derivation → prepared table. Around that core it describes
//! the model job handed to the external sampler and reduces the sampler's
//! posterior output to the series behind the diagnostic plots.
//!
//! ## Modules
//!
//! - **Preparation**: [`schema`], [`cleaner`], [`features`], [`pipeline`], [`export`]
//! - **Model job**: [`model`] (regression formulas, stratification, fitter seam)
//! - **Posterior**: [`posterior`] (summary statistics, traces, histograms)

pub mod cleaner;
pub mod error;
pub mod export;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod posterior;
pub mod schema;
pub mod types;

pub use error::PrepError;
pub use export::TableWriter;
pub use model::{DdmParameter, ModelJob, ModelSpec, ModelVariant, Regressor};
pub use pipeline::{prepare_csv, prepare_path, Preparer};
pub use posterior::{BarSeries, Histogram, NameFilter, SummaryStats, TraceStore};
pub use schema::{ColumnMap, CovariatePair, PrepConfig, RawTable};
pub use types::{PrepReport, PreparedTable, PreparedTrial};

/// Crate version embedded in every model job
pub const PREP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for model jobs
pub const PRODUCER_NAME: &str = "weber-ddm";

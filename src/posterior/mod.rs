//! Posterior post-processing
//!
//! Reads what the external sampler produced (summary statistics and sample
//! traces) and reduces it to the data behind the diagnostic plots.
//!
//! Pipeline: stats/traces CSV → SummaryStats/TraceStore → BarSeries/Histogram
//! → PosteriorReport

pub mod histogram;
pub mod report;
pub mod stats;
pub mod traces;

pub use histogram::{Histogram, DEFAULT_BINS};
pub use report::{plotted_coefficients, PosteriorReport};
pub use stats::{ascii_label, BarSeries, NameFilter, StatsRow, SummaryStats};
pub use traces::TraceStore;

//! Trial table schema
//!
//! Source and canonical column names, preparation settings, and the raw text
//! table every preparation run starts from.

mod columns;
mod raw_table;

pub use columns::*;
pub use raw_table::*;

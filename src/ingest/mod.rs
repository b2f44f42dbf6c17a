//! CSV ingestion: line splitting, positional mapping and type coercion into [`TripRecord`]s.
//!
//! [`TripRecord`]: crate::record::TripRecord
mod coerce;
mod options;
mod pipeline;

pub use coerce::{coerce_float, coerce_int};
pub use options::{IngestOptions, IngestReport};
pub use pipeline::{ingest, ingest_with_report, parse_row, parse_str, parse_str_with_report};

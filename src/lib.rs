//! Taxi-trip ingestion benchmarks.
//!
//! A CSV file of taxi trips is parsed into [`record::TripRecord`]s, loaded
//! into an exchangeable storage [`backend`], counted and deleted again. The
//! [`harness`] times each phase.

pub mod backend;
pub mod config;
pub mod errors;
pub mod harness;
pub mod ingest;
pub mod logger;
pub mod record;
pub mod synthetic;

#[cfg(test)]
mod test_support;

pub use backend::{Backend, BackendConfig, BackendFactory, BackendKind, IngestStrategy};
pub use errors::{BackendError, ConfigError, HarnessError};
pub use harness::{BenchmarkReport, Harness, HarnessConfig, HarnessState, MeasureSpan, Phase};
pub use record::TripRecord;

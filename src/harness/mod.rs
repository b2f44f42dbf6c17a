//! Benchmark harness: drives a backend through reset, ingest, insert,
//! validate and delete, timing each phase.

mod config;
mod report;
mod runner;
mod state;

pub use config::{HarnessConfig, MeasureSpan};
pub use report::{BenchmarkReport, IterationReport, PhaseTimings};
pub use runner::Harness;
pub use state::{HarnessState, Phase};

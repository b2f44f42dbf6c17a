use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::state::Phase;
use crate::backend::IngestStrategy;
use crate::errors::HarnessError;

/// Inclusive range of phases whose durations make up the measured time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureSpan {
    pub start: Phase,
    pub end: Phase,
}

impl MeasureSpan {
    /// Reset through delete.
    pub const FULL: MeasureSpan = MeasureSpan { start: Phase::Reset, end: Phase::Delete };

    /// # Errors
    /// `InvalidConfig` when `start` comes after `end`.
    pub fn new(start: Phase, end: Phase) -> Result<Self, HarnessError> {
        if start > end {
            return Err(HarnessError::InvalidConfig(format!(
                "measure span starts at {start} but ends at {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn only(phase: Phase) -> Self {
        Self { start: phase, end: phase }
    }

    pub fn contains(&self, phase: Phase) -> bool {
        self.start <= phase && phase <= self.end
    }
}

impl Default for MeasureSpan {
    fn default() -> Self {
        Self::FULL
    }
}

impl std::fmt::Display for MeasureSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub csv_path: PathBuf,
    pub separator: String,
    /// Measured iterations; each one re-runs the whole state machine.
    pub iterations: usize,
    /// Overrides the backend's preferred strategy.
    pub strategy: Option<IngestStrategy>,
    pub measure: MeasureSpan,
    /// Row count the store must hold after loading, in addition to matching the produced count.
    pub expected_rows: Option<usize>,
    pub progress_every: Option<usize>,
}

impl HarnessConfig {
    pub fn new(csv_path: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            separator: ",".to_string(),
            iterations: 10,
            strategy: None,
            measure: MeasureSpan::FULL,
            expected_rows: None,
            progress_every: None,
        }
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.iterations == 0 {
            return Err(HarnessError::InvalidConfig("iterations must be at least 1".into()));
        }
        if self.separator.is_empty() {
            return Err(HarnessError::InvalidConfig("separator must not be empty".into()));
        }
        MeasureSpan::new(self.measure.start, self.measure.end).map(|_| ())
    }
}

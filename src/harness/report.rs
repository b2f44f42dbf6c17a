use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::config::MeasureSpan;
use super::state::{HarnessState, Phase};
use crate::backend::IngestStrategy;

/// Wall-clock duration of each phase that ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTimings {
    phases: [Option<Duration>; 5],
}

impl PhaseTimings {
    pub fn record(&mut self, phase: Phase, elapsed: Duration) {
        self.phases[phase.index()] = Some(elapsed);
    }

    pub fn get(&self, phase: Phase) -> Option<Duration> {
        self.phases[phase.index()]
    }

    pub fn sum(&self, span: MeasureSpan) -> Duration {
        Phase::ALL
            .into_iter()
            .filter(|p| span.contains(*p))
            .filter_map(|p| self.get(p))
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct IterationReport {
    /// 1-based.
    pub iteration: usize,
    pub backend: &'static str,
    pub strategy: IngestStrategy,
    pub produced: usize,
    pub stored: usize,
    pub removed: usize,
    pub phases: PhaseTimings,
    pub measured: Duration,
    pub trace: Vec<HarnessState>,
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    backend: &'a str,
    iteration: usize,
    strategy: String,
    rows: usize,
    reset_ms: f64,
    ingest_ms: f64,
    insert_ms: f64,
    validate_ms: f64,
    delete_ms: f64,
    measured_ms: f64,
}

fn ms(d: Option<Duration>) -> f64 {
    d.map_or(0.0, |d| d.as_secs_f64() * 1000.0)
}

#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub iterations: Vec<IterationReport>,
    pub span: MeasureSpan,
}

impl BenchmarkReport {
    pub fn new(iterations: Vec<IterationReport>, span: MeasureSpan) -> Self {
        Self { iterations, span }
    }

    pub fn backend(&self) -> Option<&'static str> {
        self.iterations.first().map(|i| i.backend)
    }

    pub fn min(&self) -> Option<Duration> {
        self.iterations.iter().map(|i| i.measured).min()
    }

    pub fn max(&self) -> Option<Duration> {
        self.iterations.iter().map(|i| i.measured).max()
    }

    pub fn mean(&self) -> Option<Duration> {
        let n = u32::try_from(self.iterations.len()).ok().filter(|n| *n > 0)?;
        Some(self.iterations.iter().map(|i| i.measured).sum::<Duration>() / n)
    }

    pub fn summary_line(&self) -> String {
        match (self.backend(), self.min(), self.mean(), self.max()) {
            (Some(b), Some(min), Some(mean), Some(max)) => format!(
                "{b}: {} iterations over {}, min {:.3} ms, mean {:.3} ms, max {:.3} ms",
                self.iterations.len(),
                self.span,
                ms(Some(min)),
                ms(Some(mean)),
                ms(Some(max)),
            ),
            _ => "no iterations recorded".to_string(),
        }
    }

    /// Write one CSV row per iteration to `benchmark_<backend>_<timestamp>.csv` in `dir`.
    pub fn write_csv(&self, dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("benchmark_{}_{stamp}.csv", self.backend().unwrap_or("none")));
        let mut wtr = csv::Writer::from_path(&path)?;
        for it in &self.iterations {
            wtr.serialize(CsvRow {
                backend: it.backend,
                iteration: it.iteration,
                strategy: it.strategy.to_string(),
                rows: it.stored,
                reset_ms: ms(it.phases.get(Phase::Reset)),
                ingest_ms: ms(it.phases.get(Phase::Ingest)),
                insert_ms: ms(it.phases.get(Phase::Insert)),
                validate_ms: ms(it.phases.get(Phase::Validate)),
                delete_ms: ms(it.phases.get(Phase::Delete)),
                measured_ms: ms(Some(it.measured)),
            })
            .map_err(io::Error::other)?;
        }
        wtr.flush()?;
        Ok(path)
    }
}

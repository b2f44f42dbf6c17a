use std::time::Instant;

use super::config::HarnessConfig;
use super::report::{BenchmarkReport, IterationReport, PhaseTimings};
use super::state::{HarnessState, Phase, StateTrace};
use crate::backend::{BackendFactory, IngestStrategy};
use crate::errors::HarnessError;
use crate::ingest::{IngestOptions, ingest_with_report};
use crate::logger::METRICS_TARGET;
use crate::record::TripRecord;

/// Times reset → ingest → insert → validate → delete cycles against a backend.
#[derive(Debug, Clone)]
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    /// # Errors
    /// `InvalidConfig` when the configuration is unusable.
    pub fn new(config: HarnessConfig) -> Result<Self, HarnessError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run the configured number of iterations, stopping at the first failure.
    ///
    /// # Errors
    /// The first iteration's [`HarnessError`].
    pub fn run(&self, factory: &dyn BackendFactory) -> Result<BenchmarkReport, HarnessError> {
        let mut iterations = Vec::with_capacity(self.config.iterations);
        for i in 0..self.config.iterations {
            let mut report = self.run_iteration(factory)?;
            report.iteration = i + 1;
            log::info!(
                target: METRICS_TARGET,
                "{}",
                serde_json::json!({
                    "bench": report.backend,
                    "iteration": report.iteration,
                    "strategy": report.strategy.to_string(),
                    "rows": report.stored,
                    "measured_ms": report.measured.as_secs_f64() * 1000.0,
                    "span": self.config.measure.to_string(),
                })
            );
            iterations.push(report);
        }
        let report = BenchmarkReport::new(iterations, self.config.measure);
        log::info!("{}", report.summary_line());
        Ok(report)
    }

    /// One full pass through the state machine.
    ///
    /// # Errors
    /// Any backend error, or a stored count that differs from the produced count.
    pub fn run_iteration(&self, factory: &dyn BackendFactory) -> Result<IterationReport, HarnessError> {
        let mut trace = Vec::new();
        let mut report = self.run_iteration_traced(factory, &mut trace)?;
        report.trace = trace;
        Ok(report)
    }

    /// Like [`Harness::run_iteration`], but leaves the visited states in `trace`
    /// on failure as well.
    pub fn run_iteration_traced(
        &self,
        factory: &dyn BackendFactory,
        trace: &mut Vec<HarnessState>,
    ) -> Result<IterationReport, HarnessError> {
        let cfg = &self.config;
        let mut sm = StateTrace::start(trace);
        let mut timings = PhaseTimings::default();

        sm.enter(HarnessState::Resetting);
        let started = Instant::now();
        let mut backend = factory.open().map_err(|e| sm.backend_failure(e))?;
        backend.reset().map_err(|e| sm.backend_failure(e))?;
        timings.record(Phase::Reset, started.elapsed());
        let strategy = cfg.strategy.unwrap_or_else(|| backend.strategy());
        log::debug!("iteration on {} using {strategy} ingestion", backend.name());
        if strategy == IngestStrategy::BackendNative && cfg.expected_rows.is_none() {
            log::warn!("{}: native load with no expected_rows, row count is unchecked", backend.name());
        }

        sm.enter(HarnessState::Ingesting);
        let started = Instant::now();
        let mut records: Vec<TripRecord> = Vec::new();
        let produced = match strategy {
            IngestStrategy::ApplicationSide => {
                let opts = IngestOptions {
                    separator: cfg.separator.clone(),
                    progress_every: cfg.progress_every,
                };
                records = ingest_with_report(&cfg.csv_path, &opts).records;
                records.len()
            }
            IngestStrategy::BackendNative => backend
                .load_native(&cfg.csv_path, &cfg.separator)
                .map_err(|e| sm.backend_failure(e))?,
        };
        timings.record(Phase::Ingest, started.elapsed());

        sm.enter(HarnessState::Inserting);
        let started = Instant::now();
        if strategy == IngestStrategy::ApplicationSide {
            let inserted = backend.bulk_insert(&records).map_err(|e| sm.backend_failure(e))?;
            if inserted != produced {
                log::error!("{}: bulk insert stored {inserted} of {produced} records", backend.name());
                return Err(sm.count_mismatch(Phase::Insert, produced, inserted));
            }
        }
        timings.record(Phase::Insert, started.elapsed());

        sm.enter(HarnessState::Validating);
        let started = Instant::now();
        let stored = backend.count().map_err(|e| sm.backend_failure(e))?;
        if stored != produced {
            log::error!("{}: store holds {stored} rows, expected {produced}", backend.name());
            return Err(sm.count_mismatch(Phase::Validate, produced, stored));
        }
        if let Some(expected) = cfg.expected_rows
            && stored != expected
        {
            log::error!("{}: store holds {stored} rows, configured {expected}", backend.name());
            return Err(sm.count_mismatch(Phase::Validate, expected, stored));
        }
        timings.record(Phase::Validate, started.elapsed());

        sm.enter(HarnessState::Deleting);
        let started = Instant::now();
        let removed = backend.delete_all().map_err(|e| sm.backend_failure(e))?;
        timings.record(Phase::Delete, started.elapsed());
        if removed != stored {
            log::warn!("{}: delete removed {removed} of {stored} rows", backend.name());
        }

        let name = backend.name();
        drop(records);
        drop(backend);
        sm.enter(HarnessState::Done);

        Ok(IterationReport {
            iteration: 1,
            backend: name,
            strategy,
            produced,
            stored,
            removed,
            measured: timings.sum(cfg.measure),
            phases: timings,
            trace: Vec::new(),
        })
    }
}

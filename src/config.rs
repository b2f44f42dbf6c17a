//! Layered run configuration.
//!
//! Precedence: CLI > env (`TRIPBENCH_*`) > config files > defaults. Every
//! field is optional so layers can be merged field by field; defaults are
//! only applied when converting into [`HarnessConfig`] / [`BackendConfig`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::backend::{BackendConfig, BackendKind, IngestStrategy};
use crate::errors::ConfigError;
use crate::harness::{HarnessConfig, MeasureSpan, Phase};

pub const DEFAULT_CSV: &str = "trips.csv";
pub const DEFAULT_RESULTS_DIR: &str = "benchmark_results";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub backend: Option<BackendKind>,
    pub csv: Option<PathBuf>,
    pub separator: Option<String>,
    pub iterations: Option<usize>,
    pub strategy: Option<IngestStrategy>,
    pub measure_from: Option<Phase>,
    pub measure_to: Option<Phase>,
    pub expected_rows: Option<usize>,
    /// Log a progress line every N ingested records.
    pub progress_every: Option<usize>,
    pub store_dir: Option<PathBuf>,
    pub in_memory: Option<bool>,
    pub delete_if_incompatible: Option<bool>,
    pub results_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_retention: Option<usize>,
}

macro_rules! fill {
    ($dst:ident, $src:ident, $($field:ident),+) => {
        $( if $dst.$field.is_none() { $dst.$field = $src.$field; } )+
    };
}

impl BenchConfig {
    /// Fill every unset field from `lower`.
    pub fn or(mut self, lower: BenchConfig) -> Self {
        fill!(
            self, lower, backend, csv, separator, iterations, strategy, measure_from,
            measure_to, expected_rows, progress_every, store_dir, in_memory,
            delete_if_incompatible, results_dir, log_dir, log_level, log_retention
        );
        self
    }

    /// # Errors
    /// `Io` if the file cannot be read, `Toml` if it does not parse.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        Ok(toml::from_str(&text)?)
    }

    /// Read `TRIPBENCH_*` variables through `lookup`.
    ///
    /// # Errors
    /// `InvalidValue` when a variable is set but cannot be parsed.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        fn parsed<T: std::str::FromStr>(key: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError> {
            raw.map(|v| v.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue { key, value: v }))
                .transpose()
        }
        fn value_enum<T: clap::ValueEnum>(key: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError> {
            raw.map(|v| T::from_str(v.trim(), true).map_err(|_| ConfigError::InvalidValue { key, value: v }))
                .transpose()
        }
        let backend = lookup("TRIPBENCH_BACKEND")
            .map(|v| v.parse::<BackendKind>().map_err(|_| ConfigError::InvalidValue { key: "TRIPBENCH_BACKEND", value: v }))
            .transpose()?;
        Ok(Self {
            backend,
            csv: lookup("TRIPBENCH_CSV").map(PathBuf::from),
            separator: lookup("TRIPBENCH_SEPARATOR"),
            iterations: parsed("TRIPBENCH_ITERATIONS", lookup("TRIPBENCH_ITERATIONS"))?,
            strategy: value_enum("TRIPBENCH_STRATEGY", lookup("TRIPBENCH_STRATEGY"))?,
            measure_from: value_enum("TRIPBENCH_MEASURE_FROM", lookup("TRIPBENCH_MEASURE_FROM"))?,
            measure_to: value_enum("TRIPBENCH_MEASURE_TO", lookup("TRIPBENCH_MEASURE_TO"))?,
            expected_rows: parsed("TRIPBENCH_EXPECTED_ROWS", lookup("TRIPBENCH_EXPECTED_ROWS"))?,
            progress_every: parsed("TRIPBENCH_PROGRESS_EVERY", lookup("TRIPBENCH_PROGRESS_EVERY"))?,
            store_dir: lookup("TRIPBENCH_STORE_DIR").map(PathBuf::from),
            in_memory: parsed("TRIPBENCH_IN_MEMORY", lookup("TRIPBENCH_IN_MEMORY"))?,
            delete_if_incompatible: parsed(
                "TRIPBENCH_DELETE_IF_INCOMPATIBLE",
                lookup("TRIPBENCH_DELETE_IF_INCOMPATIBLE"),
            )?,
            results_dir: lookup("TRIPBENCH_RESULTS_DIR").map(PathBuf::from),
            log_dir: lookup("TRIPBENCH_LOG_DIR").map(PathBuf::from),
            log_level: lookup("TRIPBENCH_LOG_LEVEL"),
            log_retention: parsed("TRIPBENCH_LOG_RETENTION", lookup("TRIPBENCH_LOG_RETENTION"))?,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// # Errors
    /// `InvalidValue` for a reversed measure span.
    pub fn harness_config(&self) -> Result<HarnessConfig, ConfigError> {
        let mut cfg = HarnessConfig::new(self.csv.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CSV)));
        if let Some(sep) = &self.separator {
            cfg.separator = sep.clone();
        }
        if let Some(n) = self.iterations {
            cfg.iterations = n;
        }
        cfg.strategy = self.strategy;
        cfg.expected_rows = self.expected_rows;
        cfg.progress_every = self.progress_every;
        let start = self.measure_from.unwrap_or(MeasureSpan::FULL.start);
        let end = self.measure_to.unwrap_or(MeasureSpan::FULL.end);
        cfg.measure = MeasureSpan::new(start, end)
            .map_err(|_| ConfigError::InvalidValue { key: "measure", value: format!("{start}..={end}") })?;
        Ok(cfg)
    }

    pub fn backend_config(&self) -> BackendConfig {
        let mut cfg = BackendConfig::default();
        if let Some(kind) = self.backend {
            cfg.kind = kind;
        }
        if let Some(dir) = &self.store_dir {
            cfg.store_dir = dir.clone();
        }
        if let Some(m) = self.in_memory {
            cfg.in_memory = m;
        }
        if let Some(d) = self.delete_if_incompatible {
            cfg.delete_if_incompatible = d;
        }
        cfg
    }

    pub fn results_dir(&self) -> PathBuf {
        self.results_dir.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR))
    }
}

/// Candidate config files, highest precedence first.
pub fn find_config_paths(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = Vec::new();
    if let Some(p) = cli_path {
        paths.push(p.to_path_buf());
    }
    if let Ok(p) = std::env::var("TRIPBENCH_CONFIG") {
        paths.push(PathBuf::from(p));
    }
    if let Some(home) = dirs_next::home_dir() {
        paths.push(home.join(".tripbenchrc"));
    }
    if let Some(dir) = dirs_next::config_dir() {
        paths.push(dir.join("tripbench.toml"));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join("tripbench.toml"));
    }
    paths
}

/// Merge the environment over every existing config file.
///
/// An explicitly given path must exist; implicit locations are skipped when
/// missing.
///
/// # Errors
/// Propagates unreadable or malformed files and invalid env values.
pub fn load_config(cli_path: Option<&Path>) -> Result<BenchConfig, ConfigError> {
    if let Some(p) = cli_path
        && !p.exists()
    {
        return Err(ConfigError::Io {
            path: p.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
        });
    }
    let mut cfg = BenchConfig::from_env()?;
    for p in find_config_paths(cli_path) {
        if p.is_file() {
            log::debug!("loading config from {}", p.display());
            cfg = cfg.or(BenchConfig::from_file(&p)?);
        }
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn higher_layer_wins_field_by_field() {
        let cli = BenchConfig { iterations: Some(3), ..Default::default() };
        let envc = BenchConfig::from_env_with(env(&[
            ("TRIPBENCH_ITERATIONS", "5"),
            ("TRIPBENCH_BACKEND", "duckdb"),
        ]))
        .unwrap();
        let file: BenchConfig = toml::from_str(
            "iterations = 7\nbackend = \"object-store\"\nexpected_rows = 50000\n",
        )
        .unwrap();
        let merged = cli.or(envc).or(file);
        assert_eq!(merged.iterations, Some(3));
        assert_eq!(merged.backend, Some(BackendKind::Analytical));
        assert_eq!(merged.expected_rows, Some(50_000));
        assert_eq!(merged.separator, None);
    }

    #[test]
    fn defaults_fill_the_rest() {
        let h = BenchConfig::default().harness_config().unwrap();
        assert_eq!(h.iterations, 10);
        assert_eq!(h.separator, ",");
        assert_eq!(h.csv_path, PathBuf::from(DEFAULT_CSV));
        assert_eq!(h.measure, MeasureSpan::FULL);
        assert_eq!(BenchConfig::default().backend_config().kind, BackendKind::Relational);
    }

    #[test]
    fn bad_env_values_are_reported() {
        let err = BenchConfig::from_env_with(env(&[("TRIPBENCH_ITERATIONS", "ten")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "TRIPBENCH_ITERATIONS", .. }));
        let err = BenchConfig::from_env_with(env(&[("TRIPBENCH_STRATEGY", "magic")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "TRIPBENCH_STRATEGY", .. }));
    }

    #[test]
    fn measure_bounds_from_env() {
        let c = BenchConfig::from_env_with(env(&[
            ("TRIPBENCH_MEASURE_FROM", "ingest"),
            ("TRIPBENCH_MEASURE_TO", "insert"),
        ]))
        .unwrap();
        let h = c.harness_config().unwrap();
        assert_eq!(h.measure, MeasureSpan { start: Phase::Ingest, end: Phase::Insert });

        let reversed = BenchConfig { measure_from: Some(Phase::Delete), measure_to: Some(Phase::Reset), ..Default::default() };
        assert!(matches!(reversed.harness_config(), Err(ConfigError::InvalidValue { key: "measure", .. })));
    }

    #[test]
    fn progress_retention_and_incompatible_policy_reach_their_consumers() {
        let c = BenchConfig::from_env_with(env(&[
            ("TRIPBENCH_PROGRESS_EVERY", "1000"),
            ("TRIPBENCH_DELETE_IF_INCOMPATIBLE", "false"),
            ("TRIPBENCH_LOG_RETENTION", "3"),
        ]))
        .unwrap();
        assert_eq!(c.harness_config().unwrap().progress_every, Some(1000));
        assert!(!c.backend_config().delete_if_incompatible);
        assert_eq!(c.log_retention, Some(3));
        assert!(BenchConfig::default().backend_config().delete_if_incompatible);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn file_values_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tripbench.toml");
        std::fs::write(&path, "csv = \"data/trips.csv\"\nstrategy = \"native\"\nin_memory = true\n").unwrap();
        let c = BenchConfig::from_file(&path).unwrap();
        assert_eq!(c.csv, Some(PathBuf::from("data/trips.csv")));
        assert_eq!(c.strategy, Some(IngestStrategy::BackendNative));
        assert!(c.backend_config().in_memory);
    }
}

use thiserror::Error;

use crate::harness::{HarnessState, Phase};

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "analytical")]
    #[error("DuckDB: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store file corrupt: {0}")]
    Corrupt(String),

    #[error("store file incompatible: {0}")]
    Incompatible(String),

    #[error("operation not supported by {backend}: {op}")]
    Unsupported { backend: &'static str, op: &'static str },
}

/// Fatal outcome of a benchmark iteration.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("count mismatch during {phase}: expected {expected}, stored {stored}")]
    CountMismatch { phase: Phase, expected: usize, stored: usize },

    #[error("backend failure while {state}: {source}")]
    Backend {
        state: HarnessState,
        #[source]
        source: BackendError,
    },

    #[error("invalid harness configuration: {0}")]
    InvalidConfig(String),
}

impl HarnessError {
    /// State that moved the iteration into `Failed`.
    pub fn failed_in(&self) -> HarnessState {
        match self {
            Self::CountMismatch { phase, .. } => phase.state(),
            Self::Backend { state, .. } => *state,
            Self::InvalidConfig(_) => HarnessState::Idle,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

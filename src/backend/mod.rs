//! Storage backends the harness can load trips into.
//!
//! Every backend offers the same small capability set: reset, bulk insert,
//! count and delete-all. A backend may also read the CSV file itself
//! ([`Backend::load_native`]), bypassing the ingestion pipeline.
mod object_graph;
mod object_store;
mod relational;

#[cfg(feature = "analytical")]
mod analytical;

#[cfg(feature = "analytical")]
pub use analytical::{AnalyticalBackend, AnalyticalRow};
pub use object_graph::{ManagedContext, ObjectGraphBackend, ObjectId, StoreCoordinator, StoreType, TripEntity};
pub use object_store::{ObjectStoreBackend, StoredTrip, OBJECT_FILE_NAME, SCHEMA_VERSION};
pub use relational::{RelationalBackend, RelationalRow};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::BackendError;
use crate::record::TripRecord;

/// Where the rows for an iteration come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum IngestStrategy {
    /// The ingestion pipeline parses the file and the harness bulk-inserts the records.
    #[serde(rename = "application")]
    #[value(name = "application")]
    ApplicationSide,
    /// The backend reads the CSV file itself.
    #[serde(rename = "native")]
    #[value(name = "native")]
    BackendNative,
}

impl fmt::Display for IngestStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApplicationSide => f.write_str("application"),
            Self::BackendNative => f.write_str("native"),
        }
    }
}

/// Capability set shared by every store.
pub trait Backend {
    fn name(&self) -> &'static str;

    /// Strategy used when the harness configuration does not force one.
    fn strategy(&self) -> IngestStrategy {
        IngestStrategy::ApplicationSide
    }

    /// Clear any rows left behind by earlier runs.
    fn reset(&mut self) -> Result<(), BackendError>;

    /// Store all records as one logical unit and return how many were stored.
    fn bulk_insert(&mut self, records: &[TripRecord]) -> Result<usize, BackendError>;

    /// Load the CSV file directly and return the number of rows loaded.
    fn load_native(&mut self, _csv: &Path, _separator: &str) -> Result<usize, BackendError> {
        Err(BackendError::Unsupported { backend: self.name(), op: "load_native" })
    }

    fn count(&self) -> Result<usize, BackendError>;

    /// Remove every stored row and return how many were removed.
    fn delete_all(&mut self) -> Result<usize, BackendError>;
}

/// Converts the canonical record into a backend's own row shape.
pub trait RowAdapter {
    type Row<'a>;

    fn to_backend_row(record: &TripRecord) -> Self::Row<'_>;
}

/// Opens a fresh backend handle for one iteration.
pub trait BackendFactory {
    fn open(&self) -> Result<Box<dyn Backend>, BackendError>;
}

impl<F> BackendFactory for F
where
    F: Fn() -> Result<Box<dyn Backend>, BackendError>,
{
    fn open(&self) -> Result<Box<dyn Backend>, BackendError> {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    ObjectStore,
    Analytical,
    Relational,
    ObjectGraph,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] =
        [Self::ObjectStore, Self::Analytical, Self::Relational, Self::ObjectGraph];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ObjectStore => "object-store",
            Self::Analytical => "analytical",
            Self::Relational => "relational",
            Self::ObjectGraph => "object-graph",
        }
    }

    /// The object store is always file-backed.
    pub fn supports_in_memory(self) -> bool {
        !matches!(self, Self::ObjectStore)
    }

    /// Whether this build can open the backend.
    pub fn is_available(self) -> bool {
        match self {
            Self::Analytical => cfg!(feature = "analytical"),
            _ => true,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "object-store" | "objects" => Ok(Self::ObjectStore),
            "analytical" | "duckdb" => Ok(Self::Analytical),
            "relational" | "sqlite" => Ok(Self::Relational),
            "object-graph" | "graph" => Ok(Self::ObjectGraph),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

/// Explicit per-run backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Directory holding file-backed stores.
    pub store_dir: PathBuf,
    /// Keep the store in memory where the engine supports it.
    pub in_memory: bool,
    /// Discard an object-store file written with another schema version instead of failing.
    pub delete_if_incompatible: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Relational,
            store_dir: std::env::temp_dir().join("tripbench"),
            in_memory: false,
            delete_if_incompatible: true,
        }
    }
}

impl BackendConfig {
    pub fn new(kind: BackendKind, store_dir: impl Into<PathBuf>) -> Self {
        Self { kind, store_dir: store_dir.into(), ..Self::default() }
    }

    /// Open the configured backend.
    ///
    /// # Errors
    /// Returns the engine's error if the store cannot be opened, or
    /// `Unsupported` when the backend was not compiled in.
    pub fn open(&self) -> Result<Box<dyn Backend>, BackendError> {
        if self.in_memory && !self.kind.supports_in_memory() {
            log::warn!("{} has no in-memory mode; using {}", self.kind, self.store_dir.display());
        }
        if !self.in_memory || !self.kind.supports_in_memory() {
            std::fs::create_dir_all(&self.store_dir)?;
        }
        log::debug!("opening backend {} (store_dir={})", self.kind, self.store_dir.display());
        match self.kind {
            BackendKind::ObjectStore => Ok(Box::new(ObjectStoreBackend::open(
                self.store_dir.join(OBJECT_FILE_NAME),
                self.delete_if_incompatible,
            )?)),
            BackendKind::Relational => {
                let backend = if self.in_memory {
                    RelationalBackend::open_in_memory()?
                } else {
                    RelationalBackend::open(self.store_dir.join(relational::FILE_NAME))?
                };
                Ok(Box::new(backend))
            }
            BackendKind::ObjectGraph => {
                let store = if self.in_memory {
                    StoreType::InMemory
                } else {
                    StoreType::Json(self.store_dir.join(object_graph::FILE_NAME))
                };
                Ok(Box::new(ObjectGraphBackend::open(store)?))
            }
            #[cfg(feature = "analytical")]
            BackendKind::Analytical => {
                let backend = if self.in_memory {
                    AnalyticalBackend::open_in_memory()?
                } else {
                    AnalyticalBackend::open(self.store_dir.join(analytical::FILE_NAME))?
                };
                Ok(Box::new(backend))
            }
            #[cfg(not(feature = "analytical"))]
            BackendKind::Analytical => {
                Err(BackendError::Unsupported { backend: "analytical", op: "open" })
            }
        }
    }
}

impl BackendFactory for BackendConfig {
    fn open(&self) -> Result<Box<dyn Backend>, BackendError> {
        BackendConfig::open(self)
    }
}

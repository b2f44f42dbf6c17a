//! Object-graph store: a managed context stages new objects until `save`
//! commits them to the shared store coordinator.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use super::{Backend, RowAdapter};
use crate::errors::BackendError;
use crate::record::TripRecord;

pub(crate) const FILE_NAME: &str = "trips.graph.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Managed trip object; year and month stay strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripEntity {
    pub object_id: ObjectId,
    pub trip: TripRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreType {
    InMemory,
    /// Snapshot the committed objects to this JSON file on every save.
    Json(PathBuf),
}

/// Committed objects shared by every context.
#[derive(Debug)]
pub struct StoreCoordinator {
    store_type: StoreType,
    objects: RwLock<HashMap<ObjectId, TripEntity>>,
}

impl StoreCoordinator {
    fn open(store_type: StoreType) -> Result<Self, BackendError> {
        let mut objects = HashMap::new();
        if let StoreType::Json(path) = &store_type
            && path.exists()
        {
            let entities: Vec<TripEntity> = serde_json::from_reader(BufReader::new(File::open(path)?))?;
            objects.extend(entities.into_iter().map(|e| (e.object_id, e)));
        }
        Ok(Self { store_type, objects: RwLock::new(objects) })
    }

    /// Write the committed objects to the snapshot file, replacing it atomically.
    fn persist(&self) -> Result<(), BackendError> {
        let StoreType::Json(path) = &self.store_type else {
            return Ok(());
        };
        let tmp = path.with_extension("json.tmp");
        {
            let objects = self.objects.read();
            let entities: Vec<&TripEntity> = objects.values().collect();
            let mut w = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut w, &entities)?;
            w.flush()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

/// Scratchpad of uncommitted objects.
#[derive(Debug)]
pub struct ManagedContext {
    coordinator: Arc<StoreCoordinator>,
    pending: Vec<TripEntity>,
}

impl ManagedContext {
    pub fn insert_object(&mut self, entity: TripEntity) -> ObjectId {
        let id = entity.object_id;
        self.pending.push(entity);
        id
    }

    pub fn has_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Commit staged objects; returns how many were committed.
    pub fn save(&mut self) -> Result<usize, BackendError> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let staged = std::mem::take(&mut self.pending);
        let ids: Vec<ObjectId> = staged.iter().map(|e| e.object_id).collect();
        self.coordinator.objects.write().extend(staged.into_iter().map(|e| (e.object_id, e)));
        if let Err(e) = self.coordinator.persist() {
            // committed objects must match the last snapshot
            let mut objects = self.coordinator.objects.write();
            self.pending = ids.iter().filter_map(|id| objects.remove(id)).collect();
            return Err(e);
        }
        Ok(ids.len())
    }

    pub fn rollback(&mut self) {
        self.pending.clear();
    }

    /// Committed objects only.
    pub fn fetch_count(&self) -> usize {
        self.coordinator.len()
    }

    pub fn fetch(&self, id: &ObjectId) -> Option<TripEntity> {
        self.coordinator.objects.read().get(id).cloned()
    }

    /// Remove every committed object without faulting them into the context.
    pub fn batch_delete(&mut self) -> Result<usize, BackendError> {
        let taken = std::mem::take(&mut *self.coordinator.objects.write());
        let removed = taken.len();
        if let Err(e) = self.coordinator.persist() {
            self.coordinator.objects.write().extend(taken);
            return Err(e);
        }
        Ok(removed)
    }
}

pub struct ObjectGraphBackend {
    coordinator: Arc<StoreCoordinator>,
    context: ManagedContext,
}

impl ObjectGraphBackend {
    /// # Errors
    /// Returns an error if an existing JSON snapshot cannot be read.
    pub fn open(store_type: StoreType) -> Result<Self, BackendError> {
        let coordinator = Arc::new(StoreCoordinator::open(store_type)?);
        let context = ManagedContext { coordinator: Arc::clone(&coordinator), pending: Vec::new() };
        Ok(Self { coordinator, context })
    }

    /// A fresh context on the same store.
    pub fn new_context(&self) -> ManagedContext {
        ManagedContext { coordinator: Arc::clone(&self.coordinator), pending: Vec::new() }
    }

    pub fn view_context(&mut self) -> &mut ManagedContext {
        &mut self.context
    }
}

impl RowAdapter for ObjectGraphBackend {
    type Row<'a> = TripEntity;

    fn to_backend_row(record: &TripRecord) -> TripEntity {
        TripEntity { object_id: ObjectId::new(), trip: record.clone() }
    }
}

impl Backend for ObjectGraphBackend {
    fn name(&self) -> &'static str {
        "object-graph"
    }

    fn reset(&mut self) -> Result<(), BackendError> {
        self.context.rollback();
        self.context.batch_delete().map(|_| ())
    }

    fn bulk_insert(&mut self, records: &[TripRecord]) -> Result<usize, BackendError> {
        for r in records {
            self.context.insert_object(Self::to_backend_row(r));
        }
        self.context.save()
    }

    fn count(&self) -> Result<usize, BackendError> {
        Ok(self.context.fetch_count())
    }

    fn delete_all(&mut self) -> Result<usize, BackendError> {
        self.context.batch_delete()
    }
}

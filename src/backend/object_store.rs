//! Embedded object-persistence store.
//!
//! File layout: `[magic(8) | schema_version(u32 le)]` followed by one frame per
//! committed write transaction: `[len(u32 le) | crc32(u32 le) | bincode(Txn)]`.
//! Opening the store replays every frame into memory.

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use crc32fast::Hasher as Crc32Hasher;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::{Backend, RowAdapter};
use crate::errors::BackendError;
use crate::record::TripRecord;

pub const OBJECT_FILE_NAME: &str = "trip-benchmark.objects";
pub const SCHEMA_VERSION: u32 = 1;

const MAGIC: &[u8; 8] = b"TRIPOBJ\0";
const HEADER_LEN: u64 = 12;
const FRAME_HEADER_LEN: usize = 8;

/// A persisted trip object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTrip {
    /// Assigned when the write transaction commits.
    pub id: u64,
    pub trip: TripRecord,
}

#[derive(Debug, Serialize, Deserialize)]
enum Txn {
    Add(Vec<StoredTrip>),
    DeleteAll,
}

fn frame_crc(payload: &[u8]) -> u32 {
    let mut hasher = Crc32Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

pub struct ObjectStoreBackend {
    path: PathBuf,
    file: File,
    objects: Vec<StoredTrip>,
    next_id: u64,
}

impl std::fmt::Debug for ObjectStoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreBackend")
            .field("path", &self.path)
            .field("objects", &self.objects.len())
            .finish()
    }
}

impl ObjectStoreBackend {
    /// Open (or create) the object file at `path` and replay committed transactions.
    ///
    /// A file written under another schema version is discarded when
    /// `delete_if_incompatible` is set and rejected otherwise.
    ///
    /// # Errors
    /// `Incompatible` for a foreign header, `Corrupt` for a damaged frame, `Io` on file errors.
    pub fn open<P: AsRef<Path>>(path: P, delete_if_incompatible: bool) -> Result<Self, BackendError> {
        let path = path.as_ref().to_path_buf();
        let mut file =
            OpenOptions::new().read(true).write(true).create(true).truncate(false).open(&path)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let mut store = Self { path, file, objects: Vec::new(), next_id: 1 };
        if buf.is_empty() {
            store.write_header()?;
            return Ok(store);
        }
        if let Err(e) = Self::check_header(&buf) {
            if !delete_if_incompatible {
                return Err(e);
            }
            log::warn!("object store {}: {e}; discarding file", store.path.display());
            store.write_header()?;
            return Ok(store);
        }
        store.replay(&buf[HEADER_LEN as usize..])?;
        store.file.seek(SeekFrom::End(0))?;
        log::debug!(
            "object store {} opened with {} objects",
            store.path.display(),
            store.objects.len()
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn objects(&self) -> &[StoredTrip] {
        &self.objects
    }

    fn check_header(buf: &[u8]) -> Result<(), BackendError> {
        if buf.len() < HEADER_LEN as usize || &buf[..8] != MAGIC {
            return Err(BackendError::Incompatible("not an object store file".into()));
        }
        let version = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
        if version != SCHEMA_VERSION {
            return Err(BackendError::Incompatible(format!(
                "schema version {version}, expected {SCHEMA_VERSION}"
            )));
        }
        Ok(())
    }

    fn write_header(&mut self) -> Result<(), BackendError> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(MAGIC)?;
        self.file.write_all(&SCHEMA_VERSION.to_le_bytes())?;
        self.file.sync_data()?;
        self.objects.clear();
        Ok(())
    }

    fn replay(&mut self, mut frames: &[u8]) -> Result<(), BackendError> {
        while !frames.is_empty() {
            if frames.len() < FRAME_HEADER_LEN {
                return Err(BackendError::Corrupt("truncated frame header".into()));
            }
            let len = u32::from_le_bytes([frames[0], frames[1], frames[2], frames[3]]) as usize;
            let crc = u32::from_le_bytes([frames[4], frames[5], frames[6], frames[7]]);
            let body = &frames[FRAME_HEADER_LEN..];
            if body.len() < len {
                return Err(BackendError::Corrupt("truncated frame body".into()));
            }
            let payload = &body[..len];
            if frame_crc(payload) != crc {
                return Err(BackendError::Corrupt("frame checksum mismatch".into()));
            }
            let (txn, _) = decode_from_slice::<Txn, _>(payload, standard())?;
            self.apply(txn);
            frames = &body[len..];
        }
        Ok(())
    }

    fn apply(&mut self, txn: Txn) {
        match txn {
            Txn::Add(rows) => {
                if let Some(last) = rows.last() {
                    self.next_id = self.next_id.max(last.id + 1);
                }
                self.objects.extend(rows);
            }
            Txn::DeleteAll => {
                self.objects.clear();
                self.next_id = 1;
            }
        }
    }

    /// Append one transaction frame, sync it, then apply it in memory.
    fn commit(&mut self, txn: Txn) -> Result<(), BackendError> {
        let payload = encode_to_vec(&txn, standard())?;
        let len = u32::try_from(payload.len())
            .map_err(|_| BackendError::Corrupt("transaction exceeds 4 GiB".into()))?;
        let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
        frame.extend_from_slice(&len.to_le_bytes());
        frame.extend_from_slice(&frame_crc(&payload).to_le_bytes());
        frame.extend_from_slice(&payload);
        self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&frame)?;
        self.file.sync_data()?;
        self.apply(txn);
        Ok(())
    }
}

impl RowAdapter for ObjectStoreBackend {
    type Row<'a> = StoredTrip;

    fn to_backend_row(record: &TripRecord) -> StoredTrip {
        StoredTrip { id: 0, trip: record.clone() }
    }
}

impl Backend for ObjectStoreBackend {
    fn name(&self) -> &'static str {
        "object-store"
    }

    fn reset(&mut self) -> Result<(), BackendError> {
        self.delete_all().map(|_| ())
    }

    fn bulk_insert(&mut self, records: &[TripRecord]) -> Result<usize, BackendError> {
        let first = self.next_id;
        let rows: Vec<StoredTrip> = records
            .iter()
            .zip(first..)
            .map(|(r, id)| StoredTrip { id, ..Self::to_backend_row(r) })
            .collect();
        let n = rows.len();
        self.commit(Txn::Add(rows))?;
        Ok(n)
    }

    fn count(&self) -> Result<usize, BackendError> {
        Ok(self.objects.len())
    }

    fn delete_all(&mut self) -> Result<usize, BackendError> {
        let removed = self.objects.len();
        self.commit(Txn::DeleteAll)?;
        // Nothing left to replay: compact back to the bare header.
        self.file.set_len(HEADER_LEN)?;
        self.file.sync_data()?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trips(n: usize) -> Vec<TripRecord> {
        (0..n)
            .map(|i| TripRecord { vendor_name: format!("V{i}"), passenger_count: i as i64, ..Default::default() })
            .collect()
    }

    #[test]
    fn reopen_replays_committed_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OBJECT_FILE_NAME);
        {
            let mut s = ObjectStoreBackend::open(&path, true).unwrap();
            assert_eq!(s.bulk_insert(&trips(3)).unwrap(), 3);
            assert_eq!(s.bulk_insert(&trips(2)).unwrap(), 2);
        }
        let s = ObjectStoreBackend::open(&path, true).unwrap();
        assert_eq!(s.count().unwrap(), 5);
        let ids: Vec<u64> = s.objects().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(s.objects()[1].trip.vendor_name, "V1");
    }

    #[test]
    fn delete_all_compacts_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OBJECT_FILE_NAME);
        let mut s = ObjectStoreBackend::open(&path, true).unwrap();
        s.bulk_insert(&trips(10)).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > HEADER_LEN);
        assert_eq!(s.delete_all().unwrap(), 10);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), HEADER_LEN);
        drop(s);
        let s = ObjectStoreBackend::open(&path, true).unwrap();
        assert_eq!(s.count().unwrap(), 0);
    }

    #[test]
    fn ids_restart_after_delete_all_as_on_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OBJECT_FILE_NAME);
        let mut s = ObjectStoreBackend::open(&path, true).unwrap();
        s.bulk_insert(&trips(3)).unwrap();
        s.delete_all().unwrap();
        s.bulk_insert(&trips(2)).unwrap();
        let live: Vec<u64> = s.objects().iter().map(|o| o.id).collect();
        drop(s);
        let s = ObjectStoreBackend::open(&path, true).unwrap();
        let reopened: Vec<u64> = s.objects().iter().map(|o| o.id).collect();
        assert_eq!(live, vec![1, 2]);
        assert_eq!(reopened, live);
    }

    #[test]
    fn torn_trailing_frame_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OBJECT_FILE_NAME);
        {
            let mut s = ObjectStoreBackend::open(&path, true).unwrap();
            s.bulk_insert(&trips(2)).unwrap();
        }
        let bytes = std::fs::read(&path).unwrap();

        // body cut short
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();
        let err = ObjectStoreBackend::open(&path, true).unwrap_err();
        assert!(matches!(err, BackendError::Corrupt(ref m) if m.contains("body")));

        // frame header cut short
        std::fs::write(&path, &bytes[..HEADER_LEN as usize + 5]).unwrap();
        let err = ObjectStoreBackend::open(&path, true).unwrap_err();
        assert!(matches!(err, BackendError::Corrupt(ref m) if m.contains("header")));
    }

    #[test]
    fn incompatible_version_is_discarded_or_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OBJECT_FILE_NAME);
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&(SCHEMA_VERSION + 1).to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let err = ObjectStoreBackend::open(&path, false).unwrap_err();
        assert!(matches!(err, BackendError::Incompatible(_)));

        let s = ObjectStoreBackend::open(&path, true).unwrap();
        assert_eq!(s.count().unwrap(), 0);
        drop(s);
        let reread = std::fs::read(&path).unwrap();
        assert_eq!(&reread[8..12], &SCHEMA_VERSION.to_le_bytes());
    }

    #[test]
    fn checksum_mismatch_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OBJECT_FILE_NAME);
        {
            let mut s = ObjectStoreBackend::open(&path, true).unwrap();
            s.bulk_insert(&trips(2)).unwrap();
        }
        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();
        let err = ObjectStoreBackend::open(&path, true).unwrap_err();
        assert!(matches!(err, BackendError::Corrupt(_)));
    }
}

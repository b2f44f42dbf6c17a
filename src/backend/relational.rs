use rusqlite::{Connection, params};
use std::path::Path;

use super::{Backend, RowAdapter};
use crate::errors::BackendError;
use crate::record::TripRecord;

pub(crate) const FILE_NAME: &str = "trips.sqlite";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS trips (
    id INTEGER PRIMARY KEY,
    vendor_name TEXT NOT NULL,
    passenger_count INTEGER NOT NULL,
    trip_distance REAL NOT NULL,
    pickup_longitude REAL NOT NULL,
    pickup_latitude REAL NOT NULL,
    rate_code TEXT NOT NULL,
    store_and_fwd TEXT NOT NULL,
    dropoff_longitude REAL NOT NULL,
    dropoff_latitude REAL NOT NULL,
    payment_type TEXT NOT NULL,
    fare_amount REAL NOT NULL,
    extra REAL NOT NULL,
    mta_tax REAL NOT NULL,
    tip_amount REAL NOT NULL,
    tolls_amount REAL NOT NULL,
    total_amount REAL NOT NULL,
    improvement_surcharge REAL NOT NULL,
    congestion_surcharge REAL NOT NULL,
    pickup_location_id INTEGER NOT NULL,
    dropoff_location_id INTEGER NOT NULL,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL
)";

const INSERT: &str = "INSERT INTO trips (
    vendor_name, passenger_count, trip_distance, pickup_longitude, pickup_latitude,
    rate_code, store_and_fwd, dropoff_longitude, dropoff_latitude, payment_type,
    fare_amount, extra, mta_tax, tip_amount, tolls_amount, total_amount,
    improvement_surcharge, congestion_surcharge, pickup_location_id, dropoff_location_id,
    year, month
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)";

/// Row shape of the `trips` table; year and month are integers here.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationalRow<'a> {
    pub record: &'a TripRecord,
    pub year: i64,
    pub month: i64,
}

/// SQLite table store.
pub struct RelationalBackend {
    conn: Connection,
}

impl RelationalBackend {
    /// # Errors
    /// Returns the SQLite error if the database cannot be opened or the table created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BackendError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, BackendError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, BackendError> {
        conn.execute_batch(CREATE_TABLE)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RowAdapter for RelationalBackend {
    type Row<'a> = RelationalRow<'a>;

    fn to_backend_row(record: &TripRecord) -> RelationalRow<'_> {
        RelationalRow { record, year: record.year_number(), month: record.month_number() }
    }
}

impl Backend for RelationalBackend {
    fn name(&self) -> &'static str {
        "relational"
    }

    fn reset(&mut self) -> Result<(), BackendError> {
        self.conn.execute_batch(CREATE_TABLE)?;
        self.delete_all().map(|_| ())
    }

    fn bulk_insert(&mut self, records: &[TripRecord]) -> Result<usize, BackendError> {
        let tx = self.conn.transaction()?;
        let mut stored = 0usize;
        {
            let mut stmt = tx.prepare_cached(INSERT)?;
            for row in records.iter().map(Self::to_backend_row) {
                let r = row.record;
                stored += stmt.execute(params![
                    r.vendor_name,
                    r.passenger_count,
                    r.trip_distance,
                    r.pickup_longitude,
                    r.pickup_latitude,
                    r.rate_code,
                    r.store_and_fwd,
                    r.dropoff_longitude,
                    r.dropoff_latitude,
                    r.payment_type,
                    r.fare_amount,
                    r.extra,
                    r.mta_tax,
                    r.tip_amount,
                    r.tolls_amount,
                    r.total_amount,
                    r.improvement_surcharge,
                    r.congestion_surcharge,
                    r.pickup_location_id,
                    r.dropoff_location_id,
                    row.year,
                    row.month,
                ])?;
            }
        }
        tx.commit()?;
        Ok(stored)
    }

    fn count(&self) -> Result<usize, BackendError> {
        let n: i64 = self.conn.query_row("SELECT COUNT(*) FROM trips", [], |r| r.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    fn delete_all(&mut self) -> Result<usize, BackendError> {
        Ok(self.conn.execute("DELETE FROM trips", [])?)
    }
}

use duckdb::{Connection, params};
use std::path::Path;

use super::{Backend, IngestStrategy, RowAdapter};
use crate::errors::BackendError;
use crate::record::TripRecord;

pub(crate) const FILE_NAME: &str = "trips.duckdb";

const CREATE_TABLE: &str = "CREATE OR REPLACE TABLE trips (
    vendor_name VARCHAR,
    passenger_count BIGINT,
    trip_distance DOUBLE,
    pickup_longitude DOUBLE,
    pickup_latitude DOUBLE,
    rate_code VARCHAR,
    store_and_fwd VARCHAR,
    dropoff_longitude DOUBLE,
    dropoff_latitude DOUBLE,
    payment_type VARCHAR,
    fare_amount DOUBLE,
    extra DOUBLE,
    mta_tax DOUBLE,
    tip_amount DOUBLE,
    tolls_amount DOUBLE,
    total_amount DOUBLE,
    improvement_surcharge DOUBLE,
    congestion_surcharge DOUBLE,
    pickup_location_id BIGINT,
    dropoff_location_id BIGINT,
    year BIGINT,
    month BIGINT
)";

/// Row shape appended to DuckDB; year and month are BIGINT.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticalRow<'a> {
    pub record: &'a TripRecord,
    pub year: i64,
    pub month: i64,
}

/// DuckDB-backed analytical store. Prefers loading the CSV with `read_csv_auto`.
pub struct AnalyticalBackend {
    conn: Connection,
}

fn sql_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl AnalyticalBackend {
    /// # Errors
    /// Returns the DuckDB error if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BackendError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, BackendError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, BackendError> {
        let exists: i64 = conn.query_row(
            "SELECT count(*) FROM information_schema.tables WHERE table_name = 'trips'",
            [],
            |r| r.get(0),
        )?;
        if exists == 0 {
            conn.execute_batch(CREATE_TABLE)?;
        }
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RowAdapter for AnalyticalBackend {
    type Row<'a> = AnalyticalRow<'a>;

    fn to_backend_row(record: &TripRecord) -> AnalyticalRow<'_> {
        AnalyticalRow { record, year: record.year_number(), month: record.month_number() }
    }
}

impl Backend for AnalyticalBackend {
    fn name(&self) -> &'static str {
        "analytical"
    }

    fn strategy(&self) -> IngestStrategy {
        IngestStrategy::BackendNative
    }

    fn reset(&mut self) -> Result<(), BackendError> {
        self.conn.execute_batch(CREATE_TABLE)?;
        Ok(())
    }

    fn bulk_insert(&mut self, records: &[TripRecord]) -> Result<usize, BackendError> {
        let tx = self.conn.transaction()?;
        let before: i64 = tx.query_row("SELECT count(*) FROM trips", [], |r| r.get(0))?;
        {
            let mut app = tx.appender("trips")?;
            for row in records.iter().map(Self::to_backend_row) {
                let r = row.record;
                app.append_row(params![
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
            app.flush()?;
        }
        let after: i64 = tx.query_row("SELECT count(*) FROM trips", [], |r| r.get(0))?;
        tx.commit()?;
        Ok(usize::try_from(after - before).unwrap_or(0))
    }

    /// Replace `trips` with the file's contents. The first line is data, not a header.
    fn load_native(&mut self, csv: &Path, separator: &str) -> Result<usize, BackendError> {
        let sql = format!(
            "CREATE OR REPLACE TABLE trips AS SELECT * FROM read_csv_auto({}, header = false, delim = {})",
            sql_literal(&csv.display().to_string()),
            sql_literal(separator)
        );
        self.conn.execute_batch(&sql)?;
        self.count()
    }

    fn count(&self) -> Result<usize, BackendError> {
        let n: i64 = self.conn.query_row("SELECT count(*) FROM trips", [], |r| r.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    fn delete_all(&mut self) -> Result<usize, BackendError> {
        Ok(self.conn.execute("DELETE FROM trips", [])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{row, write_csv};

    #[test]
    fn quotes_are_escaped_in_literals() {
        assert_eq!(sql_literal("it's.csv"), "'it''s.csv'");
    }

    #[test]
    fn native_load_reads_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(dir.path(), "trips.csv", &[row("VTS"), row("CMT"), row("DDS")]);
        let mut b = AnalyticalBackend::open_in_memory().unwrap();
        assert_eq!(b.load_native(&csv, ",").unwrap(), 3);
        assert_eq!(b.count().unwrap(), 3);
        assert_eq!(b.delete_all().unwrap(), 3);
        assert_eq!(b.count().unwrap(), 0);
    }

    #[test]
    fn reset_restores_typed_table_after_native_load() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(dir.path(), "trips.csv", &[row("VTS")]);
        let mut b = AnalyticalBackend::open_in_memory().unwrap();
        b.load_native(&csv, ",").unwrap();
        b.reset().unwrap();
        assert_eq!(b.count().unwrap(), 0);
        let rec = TripRecord { year: "2015".into(), month: "3".into(), ..Default::default() };
        assert_eq!(b.bulk_insert(&[rec]).unwrap(), 1);
        let year: i64 = b.connection().query_row("SELECT year FROM trips", [], |r| r.get(0)).unwrap();
        assert_eq!(year, 2015);
    }

    #[test]
    fn bulk_insert_reports_rows_added_by_this_call() {
        let mut b = AnalyticalBackend::open_in_memory().unwrap();
        let recs = vec![TripRecord::default(); 4];
        assert_eq!(b.bulk_insert(&recs).unwrap(), 4);
        assert_eq!(b.bulk_insert(&recs[..3]).unwrap(), 3);
        assert_eq!(b.bulk_insert(&[]).unwrap(), 0);
        assert_eq!(b.count().unwrap(), 7);
    }
}

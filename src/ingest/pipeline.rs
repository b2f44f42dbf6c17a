use std::path::Path;

use super::coerce::{coerce_float, coerce_int};
use super::options::{IngestOptions, IngestReport};
use crate::record::{MIN_FIELDS, TripRecord, col};

/// Map one line onto a record. Returns `None` when the line has fewer than
/// [`MIN_FIELDS`] fields.
pub fn parse_row(line: &str, separator: &str) -> Option<TripRecord> {
    let f: Vec<&str> = line.split(separator).collect();
    if f.len() < MIN_FIELDS {
        return None;
    }
    Some(TripRecord {
        vendor_name: f[col::VENDOR_NAME].to_string(),
        passenger_count: coerce_int(f[col::PASSENGER_COUNT]),
        trip_distance: coerce_float(f[col::TRIP_DISTANCE]),
        pickup_longitude: coerce_float(f[col::PICKUP_LONGITUDE]),
        pickup_latitude: coerce_float(f[col::PICKUP_LATITUDE]),
        rate_code: f[col::RATE_CODE].to_string(),
        store_and_fwd: f[col::STORE_AND_FWD].to_string(),
        dropoff_longitude: coerce_float(f[col::DROPOFF_LONGITUDE]),
        dropoff_latitude: coerce_float(f[col::DROPOFF_LATITUDE]),
        payment_type: f[col::PAYMENT_TYPE].to_string(),
        fare_amount: coerce_float(f[col::FARE_AMOUNT]),
        extra: coerce_float(f[col::EXTRA]),
        mta_tax: coerce_float(f[col::MTA_TAX]),
        tip_amount: coerce_float(f[col::TIP_AMOUNT]),
        tolls_amount: coerce_float(f[col::TOLLS_AMOUNT]),
        total_amount: coerce_float(f[col::TOTAL_AMOUNT]),
        improvement_surcharge: coerce_float(f[col::IMPROVEMENT_SURCHARGE]),
        congestion_surcharge: coerce_float(f[col::CONGESTION_SURCHARGE]),
        pickup_location_id: coerce_int(f[col::PICKUP_LOCATION_ID]),
        dropoff_location_id: coerce_int(f[col::DROPOFF_LOCATION_ID]),
        year: f[col::YEAR].to_string(),
        month: f[col::MONTH].to_string(),
    })
}

/// Run the pipeline over in-memory text.
///
/// Lines are split on `'\n'` only. The first line with fewer than
/// [`MIN_FIELDS`] fields ends ingestion: nothing after it is read, even
/// well-formed lines.
pub fn parse_str_with_report(content: &str, opts: &IngestOptions) -> IngestReport {
    let mut report = IngestReport::default();
    if opts.separator.is_empty() {
        log::warn!("ingest: empty separator, no records produced");
        report.read_failed = true;
        return report;
    }
    for (idx, line) in content.split('\n').enumerate() {
        report.lines_seen += 1;
        let Some(record) = parse_row(line, &opts.separator) else {
            report.stopped_at_line = Some(idx + 1);
            break;
        };
        report.records.push(record);
        if let Some(n) = opts.progress_every
            && n > 0
            && report.records.len() % n == 0
        {
            log::info!("ingested {} records", report.records.len());
        }
    }
    log::debug!(
        "ingest: {} records from {} lines (stopped_at_line={:?})",
        report.records.len(),
        report.lines_seen,
        report.stopped_at_line
    );
    report
}

pub fn parse_str(content: &str, separator: &str) -> Vec<TripRecord> {
    parse_str_with_report(content, &IngestOptions::with_separator(separator)).records
}

/// Read `path` and run the pipeline. An unreadable file yields an empty report
/// with `read_failed` set; the error is only logged.
pub fn ingest_with_report<P: AsRef<Path>>(path: P, opts: &IngestOptions) -> IngestReport {
    let path = path.as_ref();
    log::info!("ingest: path={}, separator={:?}", path.display(), opts.separator);
    match std::fs::read_to_string(path) {
        Ok(content) => parse_str_with_report(&content, opts),
        Err(e) => {
            log::warn!("ingest: cannot read {}: {e}", path.display());
            IngestReport { read_failed: true, ..IngestReport::default() }
        }
    }
}

/// Parse the CSV at `path` into records, in file order.
pub fn ingest<P: AsRef<Path>>(path: P, separator: &str) -> Vec<TripRecord> {
    ingest_with_report(path, &IngestOptions::with_separator(separator)).records
}

mod common;

use common::{row, row_with, short_row, write_csv};
use tempfile::tempdir;
use tripbench::ingest::{IngestOptions, ingest, ingest_with_report, parse_str};
use tripbench::record::col;

#[test]
fn short_third_line_leaves_two_records() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "trips.csv", &[row("VTS"), row("CMT"), short_row(10)]);
    let records = ingest(&path, ",");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].vendor_name, "VTS");
    assert_eq!(records[1].vendor_name, "CMT");
}

#[test]
fn well_formed_lines_after_a_short_line_are_dropped() {
    let text = [row("A"), short_row(23), row("B"), row("C")].join("\n");
    let records = parse_str(&text, ",");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].vendor_name, "A");
}

#[test]
fn non_numeric_passenger_count_is_zero() {
    let text = row_with(&[(col::PASSENGER_COUNT, "abc"), (col::TRIP_DISTANCE, "far")]);
    let records = parse_str(&text, ",");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].passenger_count, 0);
    assert_eq!(records[0].trip_distance, 0.0);
}

#[test]
fn string_fields_are_verbatim() {
    let text = row_with(&[(col::PAYMENT_TYPE, " Credit "), (col::YEAR, "2O15")]);
    let r = &parse_str(&text, ",")[0];
    assert_eq!(r.payment_type, " Credit ");
    assert_eq!(r.year, "2O15");
    assert_eq!(r.year_number(), 0);
}

#[test]
fn nonexistent_path_yields_empty() {
    let dir = tempdir().unwrap();
    let rep = ingest_with_report(&dir.path().join("missing.csv"), &IngestOptions::default());
    assert!(rep.records.is_empty());
    assert!(rep.read_failed);
}

#[test]
fn header_line_is_treated_as_data() {
    let header = (0..24).map(|i| format!("col{i}")).collect::<Vec<_>>().join(",");
    let records = parse_str(&[header, row("VTS")].join("\n"), ",");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].vendor_name, "col0");
    assert_eq!(records[0].passenger_count, 0);
}

#[test]
fn crlf_month_still_converts() {
    let text = format!("{}\r\n{}\r\n", row("A"), row("B"));
    let records = parse_str(&text, ",");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].month, "1\r");
    assert_eq!(records[0].month_number(), 1);
}

//! Seeded generator for taxi-trip CSV files in the 24-column layout the
//! ingestion pipeline reads.

use csv::{Terminator, WriterBuilder};
use fake::Fake;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{self, Write};
use std::path::Path;

use crate::record::MIN_FIELDS;

const CHUNK_ROWS: usize = 100_000;
const VENDORS: [&str; 3] = ["VTS", "CMT", "DDS"];
const PAYMENTS: [&str; 4] = ["CASH", "CREDIT", "No Charge", "Dispute"];

fn coord(rng: &mut StdRng, center: f64) -> String {
    format!("{:.6}", center + rng.random_range(-0.15..0.15))
}

fn money(v: f64) -> String {
    format!("{v:.2}")
}

fn trip_fields(rng: &mut StdRng, year: i32) -> Vec<String> {
    let month: u32 = (1u32..13).fake_with_rng(rng);
    let day: u32 = (1u32..29).fake_with_rng(rng);
    let hour: u32 = (0u32..23).fake_with_rng(rng);
    let minute: u32 = (0u32..50).fake_with_rng(rng);
    let ride: u32 = (1u32..10).fake_with_rng(rng);
    let pickup = format!("{year}-{month:02}-{day:02} {hour:02}:{minute:02}:00");
    let dropoff = format!("{year}-{month:02}-{day:02} {hour:02}:{:02}:00", minute + ride);

    let distance: f64 = (0.1f64..25.0).fake_with_rng(rng);
    let fare = 2.5 + distance * 2.0;
    let extra = if rng.random_bool(0.3) { 0.5 } else { 0.0 };
    let tip = if rng.random_bool(0.4) { fare * 0.2 } else { 0.0 };
    let total = fare + extra + 0.5 + tip;
    let vendor = VENDORS[rng.random_range(0..VENDORS.len())];
    let payment = PAYMENTS[rng.random_range(0..PAYMENTS.len())];

    vec![
        vendor.to_string(),
        pickup,
        dropoff,
        (1i64..7).fake_with_rng::<i64, _>(rng).to_string(),
        format!("{distance:.2}"),
        coord(rng, -73.98),
        coord(rng, 40.75),
        String::new(),
        String::new(),
        coord(rng, -73.98),
        coord(rng, 40.75),
        payment.to_string(),
        money(fare),
        money(extra),
        "0.5".to_string(),
        money(tip),
        "0".to_string(),
        money(total),
        "0.3".to_string(),
        "0".to_string(),
        (1i64..266).fake_with_rng::<i64, _>(rng).to_string(),
        (1i64..266).fake_with_rng::<i64, _>(rng).to_string(),
        year.to_string(),
        month.to_string(),
    ]
}

/// Write `rows` synthetic trips to `path`, one per line, no header.
///
/// The same `seed` always produces the same file. With `trailing_blank` an
/// empty line follows the last row. Returns the number of rows written.
pub fn generate_csv(path: &Path, rows: usize, seed: u64, trailing_blank: bool) -> io::Result<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)?;

    let mut written = 0;
    while written < rows {
        let end = (written + CHUNK_ROWS).min(rows);
        for _ in written..end {
            let year = rng.random_range(2009..2020);
            let fields = trip_fields(&mut rng, year);
            debug_assert_eq!(fields.len(), MIN_FIELDS);
            wtr.write_record(&fields)?;
        }
        wtr.flush()?;
        written = end;
        log::info!("generated rows: {written}/{rows}");
    }

    let mut file = wtr.into_inner().map_err(|e| e.into_error())?;
    if trailing_blank {
        file.write_all(b"\n")?;
    }
    file.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{IngestOptions, ingest, ingest_with_report};

    #[test]
    fn generated_rows_are_all_ingested() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("synthetic.csv");
        assert_eq!(generate_csv(&path, 250, 7, false).unwrap(), 250);
        let rep = ingest_with_report(&path, &IngestOptions::default());
        assert_eq!(rep.records.len(), 250);
        assert!(rep.records.iter().all(|r| VENDORS.contains(&r.vendor_name.as_str())));
        assert!(rep.records.iter().all(|r| (1..=12).contains(&r.month_number())));
    }

    #[test]
    fn same_seed_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        generate_csv(&a, 40, 99, false).unwrap();
        generate_csv(&b, 40, 99, false).unwrap();
        assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
    }

    #[test]
    fn trailing_blank_line_ends_ingestion_without_loss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.csv");
        generate_csv(&path, 5, 1, true).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("\n\n"));
        assert_eq!(ingest(&path, ",").len(), 5);
    }
}

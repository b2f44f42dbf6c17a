// Run with: cargo run --release --bin benchmark_backends [rows] [iterations]
// Results saved to benchmarks/results/benchmark_<backend>_{datetime}.csv

use std::fs::create_dir_all;
use std::path::PathBuf;

use tripbench::backend::{BackendConfig, BackendKind};
use tripbench::harness::{Harness, HarnessConfig};
use tripbench::{logger, synthetic};

fn arg(n: usize, default: usize) -> usize {
	std::env::args().nth(n).and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	logger::configure_from_env();
	let rows = arg(1, 50_000);
	let iterations = arg(2, 10);

	let work = std::env::temp_dir().join(format!("tripbench_{}", uuid::Uuid::new_v4()));
	create_dir_all(&work)?;
	let csv = work.join("trips.csv");
	synthetic::generate_csv(&csv, rows, 2009, true)?;

	let mut results = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
	results.push("benchmarks/results");

	let mut config = HarnessConfig::new(&csv);
	config.iterations = iterations;
	config.expected_rows = Some(rows);
	let harness = Harness::new(config)?;

	let mut failed = Vec::new();
	for kind in BackendKind::ALL.into_iter().filter(|k| k.is_available()) {
		let backend = BackendConfig::new(kind, work.join(kind.as_str()));
		match harness.run(&backend) {
			Ok(report) => {
				let out = report.write_csv(&results)?;
				println!("{}", report.summary_line());
				println!("  -> {}", out.display());
			}
			Err(e) => {
				log::error!("{kind}: {e}");
				failed.push(kind);
			}
		}
	}

	// Stores and the input file are scratch data; keep only the results CSVs
	let _ = std::fs::remove_dir_all(&work);

	if !failed.is_empty() {
		return Err(format!("{} backend(s) failed", failed.len()).into());
	}
	Ok(())
}

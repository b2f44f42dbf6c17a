use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tripbench::backend::{BackendKind, IngestStrategy};
use tripbench::config::{BenchConfig, load_config};
use tripbench::harness::{Harness, Phase};
use tripbench::ingest::{IngestOptions, ingest_with_report};
use tripbench::{logger, synthetic};

#[derive(Parser, Debug)]
#[command(name = "tripbench", version, about = "Taxi-trip ingestion benchmarks", long_about = None)]
struct Cli {
    #[arg(long, help = "Path to a config file (TOML). If omitted, the standard locations are searched.")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Benchmark one backend: reset, ingest, insert, validate and delete per iteration")]
    Run {
        #[arg(long, help = "object-store | analytical | relational | object-graph")]
        backend: Option<BackendKind>,
        #[arg(long, help = "Taxi-trip CSV file")]
        csv: Option<PathBuf>,
        #[arg(long, help = "Field separator (default ',')")]
        separator: Option<String>,
        #[arg(long, help = "Measured iterations (default 10)")]
        iterations: Option<usize>,
        #[arg(long, help = "Force application-side or backend-native ingestion")]
        strategy: Option<IngestStrategy>,
        #[arg(long, help = "First phase included in the measured time")]
        measure_from: Option<Phase>,
        #[arg(long, help = "Last phase included in the measured time")]
        measure_to: Option<Phase>,
        #[arg(long, help = "Directory for file-backed stores")]
        store_dir: Option<PathBuf>,
        #[arg(long, help = "Keep the store in memory where supported")]
        in_memory: bool,
        #[arg(long, help = "Fail unless the store holds exactly this many rows after loading")]
        expected_rows: Option<usize>,
        #[arg(long, help = "Log a progress line every N ingested records")]
        progress_every: Option<usize>,
        #[arg(long, help = "Fail on an object-store file from another schema version instead of discarding it")]
        keep_incompatible: bool,
        #[arg(long, help = "Directory for the results CSV")]
        results_dir: Option<PathBuf>,
    },
    #[command(about = "Run the ingestion pipeline alone and report what it produced")]
    Ingest {
        csv: PathBuf,
        #[arg(long, default_value = ",")]
        separator: String,
    },
    #[command(about = "Write a synthetic taxi-trip CSV")]
    Generate {
        out: PathBuf,
        #[arg(long, default_value_t = 50_000)]
        rows: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, help = "Append an empty line after the last row")]
        trailing_blank: bool,
    },
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let file_env = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Run {
            backend,
            csv,
            separator,
            iterations,
            strategy,
            measure_from,
            measure_to,
            store_dir,
            in_memory,
            expected_rows,
            progress_every,
            keep_incompatible,
            results_dir,
        } => {
            let overrides = BenchConfig {
                backend,
                csv,
                separator,
                iterations,
                strategy,
                measure_from,
                measure_to,
                expected_rows,
                progress_every,
                store_dir,
                in_memory: in_memory.then_some(true),
                delete_if_incompatible: keep_incompatible.then_some(false),
                results_dir,
                ..Default::default()
            };
            let cfg = overrides.or(file_env);
            init_logging(&cfg);
            let backend_cfg = cfg.backend_config();
            let harness = Harness::new(cfg.harness_config()?)?;
            log::info!(
                "benchmarking {} on {} ({} iterations, measuring {})",
                backend_cfg.kind,
                harness.config().csv_path.display(),
                harness.config().iterations,
                harness.config().measure
            );
            let report = harness.run(&backend_cfg)?;
            let out = report.write_csv(&cfg.results_dir())?;
            println!("{}", report.summary_line());
            println!("results: {}", out.display());
        }
        Commands::Ingest { csv, separator } => {
            init_logging(&file_env);
            let opts = IngestOptions { progress_every: file_env.progress_every, ..IngestOptions::with_separator(&separator) };
            let rep = ingest_with_report(&csv, &opts);
            println!("records: {}", rep.records.len());
            match rep.stopped_at_line {
                Some(line) => println!("stopped at line {line}"),
                None => println!("reached end of input"),
            }
            if rep.read_failed {
                println!("input could not be read");
            }
        }
        Commands::Generate { out, rows, seed, trailing_blank } => {
            init_logging(&file_env);
            let n = synthetic::generate_csv(&out, rows, seed, trailing_blank)?;
            println!("wrote {n} rows to {}", out.display());
        }
    }
    Ok(())
}

fn init_logging(cfg: &BenchConfig) {
    logger::init_with(cfg.log_dir.as_deref(), cfg.log_level.as_deref(), cfg.log_retention);
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        // logging may not be up yet if config loading failed
        logger::init_console(None);
        log::error!("{e}");
        std::process::exit(1);
    }
}

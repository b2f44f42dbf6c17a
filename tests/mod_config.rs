use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::tempdir;
use tripbench::backend::{BackendKind, IngestStrategy};
use tripbench::config::{BenchConfig, load_config};
use tripbench::errors::ConfigError;
use tripbench::harness::{MeasureSpan, Phase};

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> =
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |k| map.get(k).cloned()
}

#[test]
fn cli_beats_env_beats_file_beats_defaults() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("tripbench.toml");
    std::fs::write(
        &file,
        r#"
backend = "object-graph"
csv = "from-file.csv"
iterations = 7
separator = ";"
"#,
    )
    .unwrap();
    let file_cfg = BenchConfig::from_file(&file).unwrap();
    let env_cfg = BenchConfig::from_env_with(lookup(&[
        ("TRIPBENCH_CSV", "from-env.csv"),
        ("TRIPBENCH_ITERATIONS", "5"),
    ]))
    .unwrap();
    let cli_cfg = BenchConfig { iterations: Some(2), ..Default::default() };

    let merged = cli_cfg.or(env_cfg).or(file_cfg);
    let h = merged.harness_config().unwrap();
    assert_eq!(h.iterations, 2);
    assert_eq!(h.csv_path, PathBuf::from("from-env.csv"));
    assert_eq!(h.separator, ";");
    assert_eq!(h.measure, MeasureSpan::FULL);
    assert_eq!(merged.backend_config().kind, BackendKind::ObjectGraph);
}

#[test]
fn explicit_file_is_loaded() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("custom.toml");
    std::fs::write(&file, "expected_rows = 50000\nmeasure_from = \"insert\"\n").unwrap();
    let cfg = load_config(Some(&file)).unwrap();
    assert_eq!(cfg.expected_rows, Some(50_000));
    let h = cfg.harness_config().unwrap();
    assert_eq!(h.measure, MeasureSpan { start: Phase::Insert, end: Phase::Delete });
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("bad.toml");
    std::fs::write(&file, "iterations = \"many\"\n").unwrap();
    assert!(matches!(BenchConfig::from_file(&file), Err(ConfigError::Toml(_))));
}

#[test]
fn env_strategy_and_backend_names() {
    let cfg = BenchConfig::from_env_with(lookup(&[
        ("TRIPBENCH_STRATEGY", "native"),
        ("TRIPBENCH_BACKEND", "sqlite"),
        ("TRIPBENCH_IN_MEMORY", "true"),
    ]))
    .unwrap();
    assert_eq!(cfg.strategy, Some(IngestStrategy::BackendNative));
    let b = cfg.backend_config();
    assert_eq!(b.kind, BackendKind::Relational);
    assert!(b.in_memory);
}

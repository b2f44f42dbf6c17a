#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tripbench::backend::{BackendConfig, BackendKind};

/// A well-formed 24-column taxi row.
pub const SAMPLE_ROW: &str = "VTS,2009-01-04 02:52:00,2009-01-04 03:02:00,1,2.63,-73.991957,40.721567,,,-73.993803,40.695922,CASH,8.9,0.5,,0,0,9.4,0.3,0,79,4,2009,1";

pub fn row_with(overrides: &[(usize, &str)]) -> String {
    let mut fields: Vec<&str> = SAMPLE_ROW.split(',').collect();
    for &(i, v) in overrides {
        fields[i] = v;
    }
    fields.join(",")
}

pub fn row(vendor: &str) -> String {
    row_with(&[(0, vendor)])
}

/// A line with only `n` fields.
pub fn short_row(n: usize) -> String {
    SAMPLE_ROW.split(',').take(n).collect::<Vec<_>>().join(",")
}

pub fn write_csv(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(name);
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(&path, content).unwrap();
    path
}

/// One config per compiled-in backend, each with its own store directory.
pub fn backend_configs(dir: &Path) -> Vec<BackendConfig> {
    BackendKind::ALL
        .into_iter()
        .filter(|k| k.is_available())
        .map(|k| BackendConfig::new(k, dir.join(k.as_str())))
        .collect()
}

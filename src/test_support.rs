#![cfg(test)]

// Tiny test-only helpers for building taxi rows and temp CSV files
use std::fs;
use std::path::{Path, PathBuf};

use crate::record::MIN_FIELDS;

/// A well-formed 24-column line as found in the taxi data.
pub const SAMPLE_ROW: &str = "VTS,2009-01-04 02:52:00,2009-01-04 03:02:00,1,2.63,-73.991957,40.721567,,,-73.993803,40.695922,CASH,8.9,0.5,,0,0,9.4,0.3,0,79,4,2009,1";

/// Sample row with a different vendor name.
pub fn row(vendor: &str) -> String {
    row_with(&[(0, vendor)])
}

/// Sample row with the given columns replaced.
pub fn row_with(overrides: &[(usize, &str)]) -> String {
    let mut fields: Vec<&str> = SAMPLE_ROW.split(',').collect();
    debug_assert_eq!(fields.len(), MIN_FIELDS);
    for &(i, v) in overrides {
        fields[i] = v;
    }
    fields.join(",")
}

/// Write `lines` joined by `'\n'` (plus a trailing newline) to `dir/name`.
pub fn write_csv(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(name);
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(&path, content).expect("write temp csv failed");
    path
}

use crate::record::TripRecord;

#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Field separator; may be longer than one character.
    pub separator: String,
    /// Log progress every N records; `None` disables progress lines.
    pub progress_every: Option<usize>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self { separator: ",".to_string(), progress_every: None }
    }
}

impl IngestOptions {
    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self { separator: separator.into(), ..Self::default() }
    }
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub records: Vec<TripRecord>,
    /// Lines examined, including the short line that ended ingestion.
    pub lines_seen: usize,
    /// 1-based line number of the first short line, if ingestion stopped early.
    pub stopped_at_line: Option<usize>,
    /// The input could not be read; `records` is empty.
    pub read_failed: bool,
}

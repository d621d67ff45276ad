//! Load Statistics
//!
//! Counters collected while streaming a model file.

use std::time::Duration;

/// Counters for one model load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Strategy that produced the model
    pub strategy: &'static str,
    /// Passes made over the file
    pub passes: usize,
    /// Lines read in the first pass, including header and blank lines
    pub lines: usize,
    /// Distinct words stored
    pub rows: usize,
    /// Rows ignored because their word appeared earlier
    pub duplicates: usize,
    /// Blank lines skipped
    pub blank_lines: usize,
    /// Words decoded with replacement characters
    pub lossy_words: usize,
    /// Model words that belong to at least one group
    pub group_words_found: usize,
    /// Bytes held by the vector matrix
    pub matrix_bytes: usize,
    /// Wall time of the whole load
    pub elapsed: Duration,
}

impl LoadStats {
    pub(crate) fn new(strategy: &'static str) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} rows ({} duplicates, {} blank lines) in {} pass(es) via {} | {} group words found | {:.1} MiB | {:.2}s",
            self.rows,
            self.duplicates,
            self.blank_lines,
            self.passes,
            self.strategy,
            self.group_words_found,
            self.matrix_bytes as f64 / (1024.0 * 1024.0),
            self.elapsed.as_secs_f64()
        )
    }
}

//! Per-file and per-batch outcome reporting.
//!
//! [`FileReport`] is produced by the file processor, [`BatchReport`] by the
//! dispatcher. Both serialize to JSON so a run summary can be saved with
//! [`BatchReport::save_to_file`].

use crate::sink::Sink;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Error rate below which a file load counts as successful.
pub const NORMAL_ERR_RATE: f64 = 0.01;

/// Line counters for one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineStats {
    /// Records written (or logged, in dry-run).
    pub processed: u64,
    pub parse_errors: u64,
    pub route_errors: u64,
    pub write_errors: u64,
}

impl LineStats {
    #[must_use]
    pub fn errors(&self) -> u64 {
        self.parse_errors + self.route_errors + self.write_errors
    }
}

/// Classification of a finished file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileOutcome {
    /// No record was processed; no rate is computed.
    NothingProcessed,
    Acceptable { error_rate: f64 },
    HighErrorRate { error_rate: f64 },
}

impl FileOutcome {
    /// Classify `stats` against `threshold` (`errors / processed < threshold`).
    #[must_use]
    pub fn classify(stats: &LineStats, threshold: f64) -> Self {
        if stats.processed == 0 {
            return Self::NothingProcessed;
        }
        let error_rate = stats.errors() as f64 / stats.processed as f64;
        if error_rate < threshold {
            Self::Acceptable { error_rate }
        } else {
            Self::HighErrorRate { error_rate }
        }
    }

    #[must_use]
    pub fn is_acceptable(&self) -> bool {
        matches!(self, Self::Acceptable { .. })
    }
}

/// Result of processing one file end-to-end.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    /// Location of the file after the completion rename.
    pub done_path: PathBuf,
    pub stats: LineStats,
    pub outcome: FileOutcome,
}

/// A file whose task did not complete.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Aggregate of one dispatcher run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub failures: Vec<FileFailure>,
    pub elapsed_ms: u64,
}

impl BatchReport {
    #[must_use]
    pub fn completed(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn high_error_rate_files(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::HighErrorRate { .. }))
            .count()
    }

    #[must_use]
    pub fn total_processed(&self) -> u64 {
        self.files.iter().map(|f| f.stats.processed).sum()
    }

    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.files.iter().map(|f| f.stats.errors()).sum()
    }

    /// Emit a one-line summary at info level.
    pub fn log_summary(&self, sink: &dyn Sink) {
        sink.info(&format!(
            "Batch finished in {} ms: {} files completed ({} with high error rate), {} failed, {} records processed, {} record errors",
            self.elapsed_ms,
            self.completed(),
            self.high_error_rate_files(),
            self.failures.len(),
            self.total_processed(),
            self.total_errors(),
        ));
    }

    /// Write the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Fails if `path` cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let mut w = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut w, self)
            .with_context(|| format!("serialize report to {}", path.display()))?;
        w.write_all(b"\n")?;
        w.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(processed: u64, errors: u64) -> LineStats {
        LineStats {
            processed,
            route_errors: errors,
            ..LineStats::default()
        }
    }

    #[test]
    fn zero_processed_is_not_rated() {
        assert_eq!(
            FileOutcome::classify(&stats(0, 7), NORMAL_ERR_RATE),
            FileOutcome::NothingProcessed
        );
    }

    #[test]
    fn threshold_is_exclusive() {
        assert!(FileOutcome::classify(&stats(101, 1), NORMAL_ERR_RATE).is_acceptable());
        assert_eq!(
            FileOutcome::classify(&stats(100, 1), NORMAL_ERR_RATE),
            FileOutcome::HighErrorRate { error_rate: 0.01 }
        );
    }

    #[test]
    fn report_serializes_outcome_tag() -> anyhow::Result<()> {
        let report = BatchReport {
            files: vec![FileReport {
                path: PathBuf::from("a.tsv.gz"),
                done_path: PathBuf::from(".a.tsv.gz"),
                stats: stats(10, 0),
                outcome: FileOutcome::Acceptable { error_rate: 0.0 },
            }],
            ..BatchReport::default()
        };
        let json = serde_json::to_value(&report)?;
        assert_eq!(json["files"][0]["outcome"]["kind"], "acceptable");
        assert_eq!(json["files"][0]["stats"]["processed"], 10);
        Ok(())
    }
}

//! Single-file ingestion.
//!
//! A file moves through four stages:
//!
//! 1. **Opening** - the file is opened and decompressed; failure is returned
//!    to the caller as a [`LoadError`].
//! 2. **Iterating** - every non-blank line is parsed, routed, encoded and
//!    written. Per-record failures only bump counters.
//! 3. **Finalizing** - the counters are classified into a [`FileOutcome`].
//! 4. **Complete** - the file is renamed with the completion prefix.
//!
//! Records within a file are handled strictly in line order.

use crate::codec::{encode, record_key};
use crate::config::LoaderConfig;
use crate::error::{LoadError, Result, WriteError};
use crate::io::compression::open_text;
use crate::record::parse_appsinstalled;
use crate::report::{FileOutcome, FileReport, LineStats};
use crate::router::EndpointMap;
use crate::sink::Sink;
use crate::writer::{CacheClient, CacheWriter};
use std::ffi::OsString;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Drives one file from open to completion marker.
///
/// Holds only immutable state, so one instance is shared by all workers.
pub struct FileProcessor {
    endpoints: Arc<EndpointMap>,
    writer: CacheWriter,
    sink: Arc<dyn Sink>,
    error_threshold: f64,
    done_prefix: String,
}

impl FileProcessor {
    pub fn new(config: &LoaderConfig, client: Arc<dyn CacheClient>, sink: Arc<dyn Sink>) -> Self {
        Self {
            endpoints: Arc::new(config.endpoints.clone()),
            writer: CacheWriter::new(client, config.dry_run, Arc::clone(&sink)),
            sink,
            error_threshold: config.error_threshold,
            done_prefix: config.done_prefix.clone(),
        }
    }

    /// Process `path` end-to-end and mark it done.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be opened or decompressed, when reading
    /// breaks mid-stream, or when the completion rename fails. Bad records
    /// never produce an error.
    pub fn process_file(&self, path: &Path) -> Result<FileReport> {
        self.sink.info(&format!("Processing {}", path.display()));
        let reader = open_text(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let stats = self.ingest(reader, path)?;
        let outcome = FileOutcome::classify(&stats, self.error_threshold);
        match outcome {
            FileOutcome::NothingProcessed => self.sink.info(&format!(
                "Nothing processed in {} ({} errors)",
                path.display(),
                stats.errors()
            )),
            FileOutcome::Acceptable { error_rate } => self.sink.info(&format!(
                "Acceptable error rate ({error_rate}). Successful load of {}",
                path.display()
            )),
            FileOutcome::HighErrorRate { error_rate } => self.sink.error(&format!(
                "High error rate ({error_rate} > {}). Failed load of {}",
                self.error_threshold,
                path.display()
            )),
        }

        let done_path = mark_done(path, &self.done_prefix)?;
        Ok(FileReport {
            path: path.to_path_buf(),
            done_path,
            stats,
            outcome,
        })
    }

    /// Feed every non-blank line of `reader` through [`Self::ingest_line`].
    pub fn ingest<R: BufRead>(&self, reader: R, path: &Path) -> Result<LineStats> {
        let mut stats = LineStats::default();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| LoadError::Read {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            self.ingest_line(&line, &mut stats);
        }
        Ok(stats)
    }

    /// Parse, route, encode and write one line, recording the result in `stats`.
    pub fn ingest_line(&self, line: &str, stats: &mut LineStats) {
        let rec = match parse_appsinstalled(line, &*self.sink) {
            Ok(rec) => rec,
            Err(e) => {
                stats.parse_errors += 1;
                self.sink.info(&format!("Cannot parse line ({e}): `{line}`"));
                return;
            }
        };

        let Ok(address) = self.endpoints.route(&rec.dev_type) else {
            stats.route_errors += 1;
            self.sink
                .error(&format!("Unknown device type: {}", rec.dev_type));
            return;
        };

        let key = record_key(&rec);
        let payload = match encode(&rec) {
            Ok(payload) => payload,
            Err(e) => {
                stats.write_errors += 1;
                self.sink
                    .exception(&format!("Cannot encode {key}"), &WriteError::Encode(e));
                return;
            }
        };

        if self.writer.write(address, &key, &payload) {
            stats.processed += 1;
        } else {
            stats.write_errors += 1;
        }
    }
}

/// Rename `path` in place with `prefix` prepended to its file name.
///
/// Returns the new path.
pub fn mark_done(path: &Path, prefix: &str) -> Result<PathBuf> {
    let rename_err = |source| LoadError::Rename {
        path: path.to_path_buf(),
        source,
    };
    let file_name = path.file_name().ok_or_else(|| {
        rename_err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no file name",
        ))
    })?;
    let mut done_name = OsString::from(prefix);
    done_name.push(file_name);
    let done_path = path.with_file_name(done_name);
    std::fs::rename(path, &done_path).map_err(rename_err)?;
    Ok(done_path)
}

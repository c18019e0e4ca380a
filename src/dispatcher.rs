//! Batch dispatch over a bounded worker pool.
//!
//! Files are discovered with [`expand_glob`], sorted, and handed one per task
//! to a dedicated rayon pool sized to the configured worker count. A failed
//! or panicking file task is logged and recorded in the [`BatchReport`]; it
//! never stops the remaining files.

use crate::config::LoaderConfig;
use crate::error::{LoadError, Result};
use crate::io::glob::expand_glob;
use crate::processor::FileProcessor;
use crate::report::{BatchReport, FileFailure, FileReport};
use crate::sink::Sink;
use crate::writer::CacheClient;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

pub struct Dispatcher {
    processor: FileProcessor,
    workers: usize,
    sink: Arc<dyn Sink>,
}

impl Dispatcher {
    pub fn new(config: &LoaderConfig, client: Arc<dyn CacheClient>, sink: Arc<dyn Sink>) -> Self {
        Self {
            processor: FileProcessor::new(config, client, Arc::clone(&sink)),
            workers: config.worker_count(),
            sink,
        }
    }

    /// Discover files matching `pattern` and process them all.
    ///
    /// # Errors
    ///
    /// Only dispatch-level problems are errors: an invalid pattern or a
    /// worker pool that cannot be built. Unreadable glob entries are logged
    /// and skipped.
    pub fn run(&self, pattern: &str) -> Result<BatchReport> {
        let files = expand_glob(pattern, &*self.sink)?;
        self.sink.info(&format!(
            "Found {} files matching {pattern}: {files:?}",
            files.len()
        ));
        self.run_files(&files)
    }

    /// Process `files` concurrently, one task per file.
    pub fn run_files(&self, files: &[PathBuf]) -> Result<BatchReport> {
        let started = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("appsload-worker-{i}"))
            .build()?;

        let results: Vec<std::result::Result<FileReport, FileFailure>> = pool.install(|| {
            files
                .par_iter()
                .with_max_len(1)
                .map(|path| self.run_one(path))
                .collect()
        });

        let mut report = BatchReport::default();
        for result in results {
            match result {
                Ok(file) => report.files.push(file),
                Err(failure) => report.failures.push(failure),
            }
        }
        report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(report)
    }

    /// Run one file task, converting errors and panics into a [`FileFailure`].
    fn run_one(&self, path: &Path) -> std::result::Result<FileReport, FileFailure> {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.processor.process_file(path)))
            .unwrap_or_else(|payload| {
                Err(LoadError::Panic {
                    path: path.to_path_buf(),
                    message: panic_message(payload.as_ref()),
                })
            });

        outcome.map_err(|e| {
            self.sink
                .exception(&format!("Error processing file {}", path.display()), &e);
            FileFailure {
                path: path.to_path_buf(),
                error: crate::error::error_chain(&e),
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

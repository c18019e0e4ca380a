//! Test doubles and fixtures.
//!
//! - [`MemorySink`] captures log emissions
//! - [`StubClient`] records puts and fails on demand
//! - [`write_lines`] writes (optionally gzip-compressed) input files

use crate::error::WriteError;
use crate::io::compression::auto_detect_writer;
use crate::logging::LogLevel;
use crate::sink::Sink;
use crate::writer::CacheClient;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Sink that keeps every emission in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<(LogLevel, String)>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all emissions so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn events(&self) -> Vec<(LogLevel, String)> {
        self.events.lock().unwrap().clone()
    }

    #[must_use]
    pub fn count_at(&self, level: LogLevel) -> usize {
        self.events().iter().filter(|(l, _)| *l == level).count()
    }

    /// Messages at `level` containing `needle`.
    #[must_use]
    pub fn find(&self, level: LogLevel, needle: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|(l, m)| *l == level && m.contains(needle))
            .map(|(_, m)| m)
            .collect()
    }

    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.events().iter().any(|(_, m)| m.contains(needle))
    }
}

impl Sink for MemorySink {
    fn emit(&self, level: LogLevel, message: &str) {
        self.events.lock().unwrap().push((level, message.to_string()));
    }
}

/// Cache client that records puts instead of sending them.
#[derive(Debug, Default)]
pub struct StubClient {
    puts: Mutex<Vec<(String, String, Vec<u8>)>>,
    fail_keys: HashSet<String>,
    fail_all: bool,
}

impl StubClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A client whose every put fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Fail puts for exactly these keys.
    #[must_use]
    pub fn failing_keys<I: IntoIterator<Item = S>, S: Into<String>>(keys: I) -> Self {
        Self {
            fail_keys: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Successful puts as `(address, key, payload)`, in call order.
    #[must_use]
    pub fn puts(&self) -> Vec<(String, String, Vec<u8>)> {
        self.puts.lock().unwrap().clone()
    }
}

impl CacheClient for StubClient {
    fn put(&self, address: &str, key: &str, value: &[u8]) -> Result<(), WriteError> {
        if self.fail_all || self.fail_keys.contains(key) {
            return Err(WriteError::Rejected {
                address: address.to_string(),
                reply: "SERVER_ERROR stub".to_string(),
            });
        }
        self.puts
            .lock()
            .unwrap()
            .push((address.to_string(), key.to_string(), value.to_vec()));
        Ok(())
    }
}

/// Write `lines` to `path`, gzip-compressed when the extension says so.
pub fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = auto_detect_writer(file, path)?;
    for line in lines {
        writer.write_all(line.as_ref().as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// `count` well-formed lines for `dev_type` with distinct device ids.
#[must_use]
pub fn sample_lines(dev_type: &str, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("{dev_type}\tdevice{i:04}\t55.55\t42.42\t{},{},{}", i, i + 1, i + 2))
        .collect()
}

//! Error types for the loader.
//!
//! Errors are split by the layer that produces them:
//!
//! | Error | Scope | Outcome |
//! |-------|-------|---------|
//! | [`ParseError`] | one line | counted as a file error, line skipped |
//! | [`RouteError`] | one record | counted as a file error, record skipped |
//! | [`WriteError`] | one record | counted as a file error, never retried |
//! | [`LoadError`] | one file or the batch | file left unmarked, batch continues |
//!
//! Only [`LoadError`] leaves the file processor.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for file and batch level operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Structural problems with a single input line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected 5 tab-separated fields, found {found}")]
    FieldCount { found: usize },

    #[error("empty device type")]
    EmptyDeviceType,

    #[error("empty device id")]
    EmptyDeviceId,
}

/// A record whose device type has no configured endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("unknown device type: {0}")]
    UnknownDeviceType(String),
}

/// Failures while storing one key in the cache.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("cannot resolve address {address}")]
    Resolve {
        address: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("cannot connect to {address}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error talking to {address}")]
    Io {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid cache key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("{address} rejected set: {reply}")]
    Rejected { address: String, reply: String },

    #[error("cannot encode payload")]
    Encode(#[from] postcard::Error),
}

/// File and batch level failures.
///
/// These are the only errors that cross from the file processor into the
/// dispatcher, where they are isolated per file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("read failed in {path} at line {line}")]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot mark {path} as done")]
    Rename {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid glob pattern {pattern:?}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("cannot build worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("worker panicked while processing {path}: {message}")]
    Panic { path: PathBuf, message: String },
}

/// Render an error together with its `source()` chain on one line.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(cause) = cur {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        cur = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_includes_sources() {
        let err = LoadError::Open {
            path: PathBuf::from("a.tsv.gz"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(error_chain(&err), "cannot open a.tsv.gz: no such file");
    }
}

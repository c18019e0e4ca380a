//! Runtime configuration for a load run.

use crate::report::NORMAL_ERR_RATE;
use crate::router::EndpointMap;
use crate::writer::DEFAULT_TIMEOUT;
use serde::Serialize;
use std::time::Duration;

/// Prefix added to a file name once it has been processed.
pub const DONE_PREFIX: &str = ".";

/// Default input pattern.
pub const DEFAULT_PATTERN: &str = "*.tsv.gz";

/// Immutable settings shared by the dispatcher and every file task.
#[derive(Debug, Clone, Serialize)]
pub struct LoaderConfig {
    pub pattern: String,
    pub endpoints: EndpointMap,
    /// Log would-be writes instead of performing them.
    pub dry_run: bool,
    /// Worker count; `None` means available parallelism.
    pub threads: Option<usize>,
    pub socket_timeout: Duration,
    pub error_threshold: f64,
    pub done_prefix: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            endpoints: EndpointMap::default(),
            dry_run: false,
            threads: None,
            socket_timeout: DEFAULT_TIMEOUT,
            error_threshold: NORMAL_ERR_RATE,
            done_prefix: DONE_PREFIX.to_string(),
        }
    }
}

impl LoaderConfig {
    /// Number of worker threads the dispatcher will start.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.threads
            .filter(|&t| t > 0)
            .unwrap_or_else(num_cpus::get)
    }
}

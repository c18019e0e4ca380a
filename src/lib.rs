//! # appsload
//!
//! A **batch loader** that moves device-to-installed-apps records from
//! gzip-compressed, tab-separated logs into a partitioned memcached cluster.
//!
//! ## Pipeline
//!
//! Each input line `dev_type \t dev_id \t lat \t lon \t app,app,...` goes
//! through:
//!
//! 1. [`record::parse_appsinstalled`] - structural validation, lenient numbers
//! 2. [`router::EndpointMap::route`] - device type to `host:port`
//! 3. [`codec::encode`] - postcard payload stored under `"{dev_type}:{dev_id}"`
//! 4. [`writer::CacheWriter::write`] - memcached `set`, or a debug log in dry-run
//!
//! [`processor::FileProcessor`] runs that sequence for every line of one
//! file, classifies the error rate, and renames the file with a leading dot.
//! [`dispatcher::Dispatcher`] discovers files by glob and runs one task per
//! file on a bounded rayon pool, isolating failures per file.
//!
//! ## Example
//!
//! ```no_run
//! use appsload::config::LoaderConfig;
//! use appsload::dispatcher::Dispatcher;
//! use appsload::sink::TracingSink;
//! use appsload::writer::MemcacheClient;
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = LoaderConfig {
//!     pattern: "/data/appsinstalled/*.tsv.gz".to_string(),
//!     dry_run: true,
//!     ..LoaderConfig::default()
//! };
//! let client = Arc::new(MemcacheClient::new(config.socket_timeout));
//! let dispatcher = Dispatcher::new(&config, client, TracingSink::shared());
//! let report = dispatcher.run(&config.pattern)?;
//! println!("{} files loaded", report.completed());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`record`] - line parser and the [`AppsInstalled`] record
//! - [`codec`] - binary payload, cache keys, self-test
//! - [`router`] - endpoint map
//! - [`writer`] - cache client capability, memcached client, dry-run writer
//! - [`processor`] - per-file state machine and completion marker
//! - [`dispatcher`] - file discovery and the worker pool
//! - [`report`] - per-file and batch outcomes
//! - [`sink`] / [`logging`] - explicit log sink and subscriber setup
//! - [`io`] - decompression and glob expansion
//! - [`testing`] - test doubles and fixtures

pub mod cli;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod io;
pub mod logging;
pub mod processor;
pub mod record;
pub mod report;
pub mod router;
pub mod sink;
pub mod testing;
pub mod writer;

pub use codec::UserApps;
pub use config::LoaderConfig;
pub use dispatcher::Dispatcher;
pub use error::{LoadError, ParseError, RouteError, WriteError};
pub use processor::FileProcessor;
pub use record::AppsInstalled;
pub use report::{BatchReport, FileOutcome, FileReport, LineStats};
pub use router::EndpointMap;
pub use sink::{Sink, TracingSink};
pub use writer::{CacheClient, CacheWriter, MemcacheClient};

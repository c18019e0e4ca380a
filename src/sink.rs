//! Observability sink passed explicitly into every component.
//!
//! Components never log through a global; they hold an `Arc<dyn Sink>` handed
//! to them at construction. [`TracingSink`] is the production implementation
//! and forwards to `tracing`, whose subscriber is installed once by
//! [`crate::logging::init_logging`].

use crate::error::error_chain;
use crate::logging::LogLevel;
use std::error::Error;
use std::sync::Arc;

/// Destination for log emissions.
pub trait Sink: Send + Sync {
    /// Emit one message at `level`.
    fn emit(&self, level: LogLevel, message: &str);

    fn debug(&self, message: &str) {
        self.emit(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.emit(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.emit(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.emit(LogLevel::Error, message);
    }

    /// Error-level emission carrying the full cause chain of `err`.
    fn exception(&self, message: &str, err: &(dyn Error + 'static)) {
        self.emit(LogLevel::Error, &format!("{message}: {}", error_chain(err)));
    }
}

/// Forwards emissions to the `tracing` macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    #[must_use]
    pub fn shared() -> Arc<dyn Sink> {
        Arc::new(Self)
    }
}

impl Sink for TracingSink {
    fn emit(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Trace => tracing::trace!(target: "appsload", "{message}"),
            LogLevel::Debug => tracing::debug!(target: "appsload", "{message}"),
            LogLevel::Info => tracing::info!(target: "appsload", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "appsload", "{message}"),
            LogLevel::Error => tracing::error!(target: "appsload", "{message}"),
        }
    }
}

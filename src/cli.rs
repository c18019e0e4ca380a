//! Command-line interface.

use crate::config::{DEFAULT_PATTERN, LoaderConfig};
use crate::logging::{LogConfig, LogFormat, LogLevel};
use crate::router::EndpointMap;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Load installed-apps logs into memcached, routed by device type.
#[derive(Parser, Debug, Clone)]
#[command(name = "appsload", version, about)]
pub struct Cli {
    /// Run the encoder round-trip self-test and exit
    #[arg(short = 't', long = "test")]
    pub test: bool,

    /// Append logs to this file instead of stderr
    #[arg(short = 'l', long = "log", env = "APPSLOAD_LOG")]
    pub log: Option<PathBuf>,

    /// Log would-be writes instead of sending them
    #[arg(long = "dry", env = "APPSLOAD_DRY")]
    pub dry: bool,

    /// Glob pattern of input files
    #[arg(long, default_value = DEFAULT_PATTERN, env = "APPSLOAD_PATTERN")]
    pub pattern: String,

    #[arg(long, default_value = "127.0.0.1:33013", env = "APPSLOAD_IDFA")]
    pub idfa: String,

    #[arg(long, default_value = "127.0.0.1:33014", env = "APPSLOAD_GAID")]
    pub gaid: String,

    #[arg(long, default_value = "127.0.0.1:33015", env = "APPSLOAD_ADID")]
    pub adid: String,

    #[arg(long, default_value = "127.0.0.1:33016", env = "APPSLOAD_DVID")]
    pub dvid: String,

    /// Worker threads (defaults to available parallelism)
    #[arg(long, env = "APPSLOAD_THREADS")]
    pub threads: Option<usize>,

    /// Connect and I/O timeout per write, in milliseconds
    #[arg(
        long,
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..),
        env = "APPSLOAD_TIMEOUT_MS"
    )]
    pub timeout_ms: u64,

    /// Save a JSON batch summary to this file
    #[arg(long, env = "APPSLOAD_REPORT")]
    pub report: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "APPSLOAD_LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Cli {
    #[must_use]
    pub fn endpoints(&self) -> EndpointMap {
        EndpointMap::new([
            ("idfa", self.idfa.as_str()),
            ("gaid", self.gaid.as_str()),
            ("adid", self.adid.as_str()),
            ("dvid", self.dvid.as_str()),
        ])
    }

    #[must_use]
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            pattern: self.pattern.clone(),
            endpoints: self.endpoints(),
            dry_run: self.dry,
            threads: self.threads,
            socket_timeout: Duration::from_millis(self.timeout_ms),
            ..LoaderConfig::default()
        }
    }

    /// Info by default, debug in dry-run so payload renderings are visible.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig::builder()
            .level(if self.dry { LogLevel::Debug } else { LogLevel::Info })
            .format(self.log_format)
            .file(self.log.clone())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_known_endpoints() {
        let cli = Cli::parse_from(["appsload"]);
        assert_eq!(cli.pattern, "*.tsv.gz");
        assert_eq!(cli.endpoints(), EndpointMap::default());
        assert_eq!(cli.loader_config().socket_timeout, Duration::from_secs(1));
        assert_eq!(cli.log_config().level, LogLevel::Info);
    }

    #[test]
    fn dry_run_enables_debug_logging() {
        let cli = Cli::parse_from(["appsload", "--dry", "--pattern", "/data/*.gz", "-l", "run.log"]);
        assert!(cli.loader_config().dry_run);
        assert_eq!(cli.loader_config().pattern, "/data/*.gz");
        assert_eq!(cli.log_config().level, LogLevel::Debug);
        assert_eq!(cli.log.as_deref(), Some(std::path::Path::new("run.log")));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(Cli::try_parse_from(["appsload", "--timeout-ms", "0"]).is_err());
        let cli = Cli::try_parse_from(["appsload", "--timeout-ms", "250"]).unwrap();
        assert_eq!(cli.loader_config().socket_timeout, Duration::from_millis(250));
    }
}

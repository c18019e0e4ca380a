//! appsload - entry point

use anyhow::{Context, Result};
use appsload::cli::Cli;
use appsload::codec::self_test;
use appsload::dispatcher::Dispatcher;
use appsload::logging::init_logging;
use appsload::sink::{Sink, TracingSink};
use appsload::writer::MemcacheClient;
use clap::Parser;
use std::process;
use std::sync::Arc;

fn main() {
    let cli = Cli::parse();

    let log_config = match cli.log_config().with_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(2);
        }
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Error: cannot initialize logging: {e:#}");
        process::exit(2);
    }
    let sink = TracingSink::shared();

    if cli.test {
        match self_test(&*sink) {
            Ok(()) => process::exit(0),
            Err(e) => {
                sink.error(&format!("Self-test failed: {e:#}"));
                process::exit(1);
            }
        }
    }

    if let Err(e) = run(&cli, Arc::clone(&sink)) {
        sink.error(&format!("Unexpected error: {e:#}"));
        process::exit(1);
    }
}

fn run(cli: &Cli, sink: Arc<dyn Sink>) -> Result<()> {
    let config = cli.loader_config();
    sink.info(&format!(
        "Memc loader started with options: {}",
        serde_json::to_string(&config).context("render options")?
    ));
    for (dev_type, address) in config.endpoints.iter() {
        sink.debug(&format!("Route {dev_type} -> {address}"));
    }

    let client = Arc::new(MemcacheClient::new(config.socket_timeout));
    let dispatcher = Dispatcher::new(&config, client, Arc::clone(&sink));
    let report = dispatcher.run(&config.pattern)?;
    report.log_summary(&*sink);

    if let Some(path) = &cli.report {
        report
            .save_to_file(path)
            .with_context(|| format!("save report to {}", path.display()))?;
    }
    Ok(())
}

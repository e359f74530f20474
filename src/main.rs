// Main entrypoint for the commit daemon.

use anyhow::{Context, Result};
use clap::Parser;

use commitd::app;
use commitd::config::{Args, Defaults, LogFormat, LogSettings, Settings};
use commitd::metrics;

/// Configures structured logging from the resolved log settings.
fn configure_logger(log: &LogSettings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log.level.as_str()));

    match log.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

fn main() -> Result<()> {
    // Parse command-line arguments and resolve the effective settings
    let args = Args::parse();
    let settings = Settings::resolve(&args, &Defaults::default());

    // Initialize the Prometheus metrics exporter BEFORE the tokio runtime
    // starts to avoid runtime conflicts
    let metrics_handle = metrics::init_exporter();

    configure_logger(&settings.log);

    // Now start the async runtime
    tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?
        .block_on(app::bootstrap(settings, metrics_handle))
}

//! Tracing subscriber setup shared by the binaries.
//!
//! Every event goes to stdout and, when configured, is appended to a log
//! file as well.

use std::fs::OpenOptions;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LogConfig, LogFormat};
use crate::error::{Error, Result};

/// Build the env filter: `RUST_LOG` wins, otherwise the configured level.
pub fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = env_filter(config);

    let file = match config.file {
        Some(ref path) => Some(Arc::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    Error::Config(format!("Failed to open log file {}: {}", path.display(), e))
                })?,
        )),
        None => None,
    };

    let result = match (config.format, file) {
        (LogFormat::Pretty, Some(file)) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::io::stdout.and(file))
            .try_init(),
        (LogFormat::Pretty, None) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init(),
        (LogFormat::Json, Some(file)) => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stdout.and(file))
            .try_init(),
        (LogFormat::Json, None) => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
    };

    result.map_err(|e| Error::Internal(format!("Failed to initialize logging: {}", e)))
}

/// Log the startup banner.
pub fn log_startup(component: &str) {
    info!("{}", "=".repeat(80));
    info!(
        "{} {} ({}) started at {}",
        crate::NAME,
        crate::VERSION,
        component,
        chrono::Local::now().to_rfc3339()
    );
    info!("{}", "=".repeat(80));
}

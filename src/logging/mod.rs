//! Structured logging setup using tracing
//!
//! Console output is always enabled; when a log directory is configured
//! a JSON layer with daily rotation is added. The returned guard must be
//! kept alive for the duration of the program so buffered logs flush.

use crate::config::LoggingConfig;
use crate::domain::errors::{DocveilError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Keeps the non-blocking file writer alive
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the logging system from configuration
pub fn init_logging(level: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("docveil={level}")));

    let mut layers = Vec::new();
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(env_filter)
        .boxed();
    layers.push(console_layer);

    let file_guard = if let Some(directory) = &config.directory {
        std::fs::create_dir_all(directory).map_err(|e| {
            DocveilError::Configuration(format!(
                "Failed to create log directory {}: {e}",
                directory.display()
            ))
        })?;
        let appender = RollingFileAppender::new(Rotation::DAILY, directory, "docveil.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let file_filter = EnvFilter::new(format!("docveil={level}"));
        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(non_blocking)
            .with_filter(file_filter)
            .boxed();
        layers.push(file_layer);
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| DocveilError::Configuration(format!("Failed to initialize logging: {e}")))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

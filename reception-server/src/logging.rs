//! Logging infrastructure for the reception bridge.
//!
//! Log output goes to stderr according to the configured mode, and
//! additionally to a plain-text log file so the `/logs` endpoint can serve
//! recent history.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging mode for different deployments.
#[derive(Debug, Clone, Copy)]
pub enum LoggingMode {
    /// No stderr output; the log file (when configured) still receives
    /// everything.
    Silent,
    /// Compact stderr output for normal operation.
    Development,
    /// Verbose diagnostics with source locations.
    Debug,
}

/// Logging configuration error.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("failed to open log file: {0}")]
    LogFile(#[from] io::Error),
}

/// Initialize logging with the specified mode.
///
/// Should be called once, early in the process lifecycle. The optional
/// `log_file` is appended to with ANSI colors disabled so its tail can be
/// served as plain text.
pub fn init_logging(mode: LoggingMode, log_file: Option<&Path>) -> Result<(), LoggingError> {
    let writer = match log_file {
        Some(path) => Some(open_log_file(path)?),
        None => None,
    };

    match mode {
        LoggingMode::Silent => {
            let Some(writer) = writer else {
                return Ok(());
            };
            let filter = create_env_filter("info");
            Registry::default()
                .with(file_layer(writer))
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Development => {
            let filter = create_env_filter("info");
            Registry::default()
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .with(writer.map(file_layer))
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let filter = create_env_filter("debug");
            Registry::default()
                .with(
                    fmt::layer()
                        .pretty()
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(writer.map(file_layer))
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Initialize logging from the `AIRSEND_LOG_MODE` environment variable
/// (`silent`, `development`, or `debug`; defaults to development).
pub fn init_logging_from_env(log_file: Option<&Path>) -> Result<(), LoggingError> {
    let mode = match std::env::var("AIRSEND_LOG_MODE").as_deref() {
        Ok("silent") => LoggingMode::Silent,
        Ok("debug") => LoggingMode::Debug,
        _ => LoggingMode::Development,
    };
    init_logging(mode, log_file)
}

fn open_log_file(path: &Path) -> Result<Arc<File>, io::Error> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Arc::new(file))
}

fn file_layer<S>(
    writer: Arc<File>,
) -> fmt::Layer<S, fmt::format::DefaultFields, fmt::format::Format, Arc<File>> {
    fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(writer)
}

/// Environment filter honoring `AIRSEND_LOG_LEVEL`, then `RUST_LOG`, then
/// the mode's default level.
fn create_env_filter(default_level: &str) -> EnvFilter {
    if let Ok(level) = std::env::var("AIRSEND_LOG_LEVEL") {
        EnvFilter::new(level)
    } else if let Ok(rust_log) = std::env::var("RUST_LOG") {
        EnvFilter::new(rust_log)
    } else {
        EnvFilter::new(default_level)
    }
}

/// Last `lines` lines of the log file as plain text.
pub fn tail_lines(path: &Path, lines: usize) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let all: Vec<&str> = content.lines().collect();
            let start = all.len().saturating_sub(lines);
            all[start..].join("\n")
        }
        Err(_) => "No logs available\n".to_string(),
    }
}

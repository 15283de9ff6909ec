//! Centralized file-based logging system
//!
//! Writes logs to files under the configured directory, separated by log type:
//! - main/  - all application logs (JSON)
//! - error/ - warnings and errors only
//! - feed/  - price feed polling
//! - perf/  - performance monitor and adaptive retuning

use crate::infrastructure::config::LoggingConfig;
use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_TYPES: [&str; 4] = ["main", "error", "feed", "perf"];

/// Initialize logging
///
/// Console output is always on. With `file_output` the log directory and its
/// subdirectories are created and daily rolling appenders attached.
/// The returned guards must be kept alive for the duration of the program.
pub fn init_logging(config: &LoggingConfig) -> io::Result<Vec<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if !config.file_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).with_level(true))
            .init();
        return Ok(Vec::new());
    }

    let logs_dir = config.directory.as_path();
    create_log_dirs(logs_dir)?;

    let mut guards = Vec::new();

    // Main log - all logs
    let (main_appender, main_guard) = create_appender(logs_dir, "main");
    guards.push(main_guard);

    // Error log - ERROR and WARN only
    let (error_appender, error_guard) = create_appender(logs_dir, "error");
    guards.push(error_guard);

    // Feed log - remote sync
    let (feed_appender, feed_guard) = create_appender(logs_dir, "feed");
    guards.push(feed_guard);

    // Perf log - monitor and retune
    let (perf_appender, perf_guard) = create_appender(logs_dir, "perf");
    guards.push(perf_guard);

    let main_layer = tracing_subscriber::fmt::layer()
        .with_writer(main_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json();

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(tracing_subscriber::filter::LevelFilter::WARN);

    let feed_layer = tracing_subscriber::fmt::layer()
        .with_writer(feed_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target().contains("feed")
        }));

    let perf_layer = tracing_subscriber::fmt::layer()
        .with_writer(perf_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target().contains("perf") || metadata.target().contains("monitor")
        }));

    // Console layer for development
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(main_layer)
        .with(error_layer)
        .with(feed_layer)
        .with(perf_layer)
        .with(console_layer)
        .init();

    tracing::info!(
        "Logging system initialized. Log files in {}",
        logs_dir.display()
    );

    Ok(guards)
}

/// Create the log directory and one subdirectory per log type
fn create_log_dirs(logs_dir: &Path) -> io::Result<()> {
    for log_type in LOG_TYPES {
        fs::create_dir_all(logs_dir.join(log_type))?;
    }
    Ok(())
}

/// Create a rolling file appender
fn create_appender(logs_dir: &Path, name: &str) -> (NonBlocking, WorkerGuard) {
    let appender = RollingFileAppender::new(Rotation::DAILY, logs_dir.join(name), name);

    tracing_appender::non_blocking(appender)
}

/// Log macro helpers for specific log types
#[macro_export]
macro_rules! log_feed {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "feed", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_perf {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "perf", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_main {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "main", $level, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_creation() {
        let test_dir = std::env::temp_dir().join(format!("price_ticker_logs_{}", std::process::id()));
        fs::remove_dir_all(&test_dir).ok();

        create_log_dirs(&test_dir).unwrap();
        for log_type in LOG_TYPES {
            assert!(test_dir.join(log_type).is_dir());
        }
        // idempotent
        create_log_dirs(&test_dir).unwrap();

        fs::remove_dir_all(&test_dir).ok();
    }
}

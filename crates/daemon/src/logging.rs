// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide tracing subscriber

use crate::config::{LogConfig, LogSink};
use crate::lifecycle::LifecycleError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, falling back to the configured level
pub(crate) fn env_filter(config: &LogConfig) -> Result<EnvFilter, LifecycleError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| LifecycleError::Logging(format!("invalid log level {:?}: {}", config.level, e)))
}

/// Install the global subscriber
///
/// The returned guard flushes buffered lines when dropped; hold it for the
/// life of the process.
pub fn setup_logging(config: &LogConfig) -> Result<WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*};

    let filter = env_filter(config)?;

    let (writer, guard) = match &config.sink {
        LogSink::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogSink::File(path) => {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => std::path::Path::new("."),
            };
            std::fs::create_dir_all(dir)?;
            let file_name = path.file_name().ok_or_else(|| {
                LifecycleError::Logging(format!("log sink {} is not a file", path.display()))
            })?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .map_err(|e| LifecycleError::Logging(e.to_string()))?;

    Ok(guard)
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration file

use corral_engine::EngineConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Daemon configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Log Store file holding the WAL
    pub wal_file: PathBuf,
    /// Permission bits for a newly created store file
    #[serde(default = "default_wal_file_mode")]
    pub wal_file_mode: u32,
    /// How long to wait for another process to release the store file
    #[serde(default = "default_wal_open_timeout", with = "humantime_serde")]
    pub wal_open_timeout: Duration,
    #[serde(flatten)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_wal_file_mode() -> u32 {
    0o600
}

fn default_wal_open_timeout() -> Duration {
    Duration::from_secs(8)
}

impl Config {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Logging and error reporting
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, overridden by `RUST_LOG`
    pub level: String,
    pub sink: LogSink,
    /// Errors flagged for reporting are posted here
    pub error_reporting_endpoint: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            sink: LogSink::Stdout,
            error_reporting_endpoint: None,
        }
    }
}

/// Where log lines go: `"stdout"` or a file path
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum LogSink {
    Stdout,
    File(PathBuf),
}

impl From<String> for LogSink {
    fn from(value: String) -> Self {
        match value.as_str() {
            "stdout" | "" => LogSink::Stdout,
            _ => LogSink::File(PathBuf::from(value)),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

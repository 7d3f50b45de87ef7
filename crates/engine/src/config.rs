// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine tuning

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeouts and limits for engine operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest wait for an operation's locks
    #[serde(with = "humantime_serde")]
    pub lock_timeout: Duration,
    /// Bound on each driver call
    #[serde(with = "humantime_serde")]
    pub driver_timeout: Duration,
    /// Units running at once within one operation
    pub max_concurrency: usize,
    /// Results buffered ahead of the consumer
    pub result_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(30),
            driver_timeout: Duration::from_secs(120),
            max_concurrency: 20,
            result_buffer: 16,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

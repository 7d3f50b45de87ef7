// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Corral daemon (corrald)
//!
//! Owns the WAL store file, runs startup recovery and keeps the engine
//! available until signalled to stop.

pub mod config;
pub mod lifecycle;
pub mod logging;

pub use config::{Config, ConfigError, LogConfig, LogSink};
pub use lifecycle::{startup, startup_with, Daemon, LifecycleError, Reporting};
pub use logging::setup_logging;

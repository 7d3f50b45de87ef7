// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injected observability
//!
//! Library code logs through `tracing` and forwards failures worth paging on
//! to an [`ErrorReporter`] it was handed at construction. Nothing here
//! installs a subscriber or holds process-wide state.

use std::fmt;
use std::sync::Arc;

/// Sink for errors that should leave the process (alerting, issue trackers)
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, message: &str);
}

/// Reporter that drops everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpReporter;

impl ErrorReporter for NoOpReporter {
    fn report(&self, _message: &str) {}
}

/// Observability handle passed into the WAL and the engine
#[derive(Clone)]
pub struct Observer {
    reporter: Arc<dyn ErrorReporter>,
}

impl Observer {
    pub fn new(reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { reporter }
    }

    /// Observer that only logs
    pub fn noop() -> Self {
        Self::new(Arc::new(NoOpReporter))
    }

    /// Log at error level and forward to the reporter
    pub fn error(&self, message: impl fmt::Display) {
        let message = message.to_string();
        tracing::error!("{}", message);
        self.reporter.report(&message);
    }

    /// Report `err` with some context, then hand it back for propagation
    pub fn err<E: fmt::Display>(&self, context: &str, err: E) -> E {
        self.error(format_args!("{}: {}", context, err));
        err
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "observe_tests.rs"]
mod tests;

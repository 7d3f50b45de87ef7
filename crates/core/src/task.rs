// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helpers for isolated tasks

use tokio::task::JoinError;

/// Describe why a spawned task did not return
pub fn join_failure(err: JoinError) -> String {
    if err.is_cancelled() {
        return "cancelled".to_string();
    }
    let panic = err.into_panic();
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("panicked: {}", message)
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-unit results of a fan-out operation

use serde::{Deserialize, Serialize};

/// Outcome of one unit of work (one image, one node, ...)
///
/// Exactly one is produced per unit, whether the unit succeeded or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// Image reference, node name, or whatever the unit targeted
    pub target: String,
    pub success: bool,
    pub messages: Vec<String>,
}

impl OperationResult {
    pub fn succeeded(target: impl Into<String>, messages: Vec<String>) -> Self {
        Self {
            target: target.into(),
            success: true,
            messages,
        }
    }

    pub fn failed(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            success: false,
            messages: vec![message.into()],
        }
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;

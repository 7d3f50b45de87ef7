// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake error reporter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use corral_core::ErrorReporter;
use std::sync::{Arc, Mutex};

/// Records every reported message
#[derive(Clone, Debug, Default)]
pub struct FakeErrorReporter {
    messages: Arc<Mutex<Vec<String>>>,
}

impl FakeErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl ErrorReporter for FakeErrorReporter {
    fn report(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for cluster inventory, container engines and error reporting

pub mod cluster;
pub mod driver;
pub mod report;
pub mod traced;

pub use cluster::{ClusterError, ClusterStore, NoOpClusterStore, NodeHandle};
pub use driver::{
    DriverError, EngineDriver, ImageDeleteItem, NoOpEngineDriver, RemoveImageOptions,
};
pub use report::HttpErrorReporter;
pub use traced::{TracedClusterStore, TracedEngineDriver};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use cluster::{ClusterCall, FakeClusterStore};
#[cfg(any(test, feature = "test-support"))]
pub use driver::{DriverCall, FakeEngineDriver};
#[cfg(any(test, feature = "test-support"))]
pub use report::FakeErrorReporter;

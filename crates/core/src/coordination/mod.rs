// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination primitives for cluster resources
//!
//! Every mutating operation holds the lock for each resource key it touches.
//! Keys are per resource, not global, so unrelated nodes proceed in parallel.

pub mod lock;

pub use lock::{DistributedLock, LocalLock, LocalLockProvider, LockError, LockProvider};

/// Lock key shared by every operation that mutates a node
pub fn node_key(pod: &str, node: &str) -> String {
    format!("node/{}/{}", pod, node)
}

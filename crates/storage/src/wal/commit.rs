// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot commit handle for a WAL entry

use super::log::WalError;
use crate::kv::LogStore;
use corral_core::Observer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Marks a logged operation complete by deleting its entry
///
/// Only the first successful [`commit`](Commit::commit) deletes; later calls
/// are no-ops. A commit that fails can be retried.
pub struct Commit {
    key: String,
    done: AtomicBool,
    store: Arc<LogStore>,
    observer: Observer,
}

impl Commit {
    pub(crate) fn new(key: String, store: Arc<LogStore>, observer: Observer) -> Self {
        Self {
            key,
            done: AtomicBool::new(false),
            store,
            observer,
        }
    }

    /// Store key of the guarded entry
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Delete the entry
    ///
    /// Returns `Ok(true)` if this call deleted it, `Ok(false)` if it was
    /// already committed.
    pub fn commit(&self) -> Result<bool, WalError> {
        if self
            .done
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(key = %self.key, "already committed");
            return Ok(false);
        }

        if let Err(e) = self.store.delete(self.key.as_bytes()) {
            self.done.store(false, Ordering::SeqCst);
            return Err(self.observer.err("commit WAL entry", WalError::Store(e)));
        }

        tracing::debug!(key = %self.key, "committed");
        Ok(true)
    }
}

impl Drop for Commit {
    fn drop(&mut self) {
        if !self.is_done() {
            tracing::warn!(key = %self.key, "commit dropped uncommitted; entry left for recovery");
        }
    }
}

impl std::fmt::Debug for Commit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Commit")
            .field("key", &self.key)
            .field("done", &self.is_done())
            .finish()
    }
}

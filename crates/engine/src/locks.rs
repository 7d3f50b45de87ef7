// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multi-key lock acquisition for one operation

use corral_core::{Context, DistributedLock, LockError, LockProvider};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Locks held by one operation, released together
pub(crate) struct HeldLocks {
    held: Vec<(Arc<dyn DistributedLock>, Context)>,
}

impl HeldLocks {
    /// Acquire every key in sorted order, bounded by `ctx` and `timeout`
    ///
    /// `timeout` bounds only the waiting; each held key's context follows
    /// `ctx`. Sorted acquisition keeps overlapping operations from deadlocking. On
    /// failure the keys already taken are released before returning.
    pub async fn acquire<L: LockProvider + ?Sized>(
        provider: &L,
        ctx: &Context,
        keys: BTreeSet<String>,
        timeout: Duration,
    ) -> Result<Self, LockError> {
        let deadline = Instant::now() + timeout;
        let mut locks = Self { held: Vec::new() };

        for key in keys {
            let lock = provider.lock(&key);
            match lock.acquire_before(ctx, deadline).await {
                Ok(scope) => locks.held.push((lock, scope)),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "lock acquisition failed");
                    locks.release().await;
                    return Err(e);
                }
            }
        }

        Ok(locks)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.held.iter().map(|(lock, _)| lock.key()).collect()
    }

    /// Release in reverse acquisition order
    pub async fn release(self) {
        for (lock, scope) in self.held.into_iter().rev() {
            if let Err(e) = lock.release(&scope).await {
                tracing::error!(key = lock.key(), error = %e, "lock release failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;

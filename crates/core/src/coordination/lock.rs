// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named resource locks
//!
//! [`DistributedLock`] is the seam: a local mutex in single-process
//! deployments, a networked lock service elsewhere. Acquisition hands back a
//! scoped [`Context`] that is cancelled once the lock is released.

use crate::context::{CancelToken, Context, ContextError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;
use tokio::time::Instant;

/// Errors from lock operations
#[derive(Debug, Error)]
pub enum LockError {
    #[error("timed out acquiring lock {key}")]
    Timeout { key: String },
    #[error("cancelled while acquiring lock {key}")]
    Cancelled { key: String },
    #[error("lock {key} released without a held acquisition")]
    NotHeld { key: String },
}

impl LockError {
    fn from_context(key: &str, err: ContextError) -> Self {
        match err {
            ContextError::Cancelled => LockError::Cancelled {
                key: key.to_string(),
            },
            ContextError::DeadlineExceeded => LockError::Timeout {
                key: key.to_string(),
            },
        }
    }
}

/// Mutual exclusion on one resource key
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Resource key this lock guards
    fn key(&self) -> &str;

    /// Wait for the resource, bounded by `ctx`
    ///
    /// Returns the context for the critical section.
    async fn acquire(&self, ctx: &Context) -> Result<Context, LockError>;

    /// Like [`acquire`](Self::acquire), but stop waiting at `deadline`
    ///
    /// The deadline bounds only the wait: the returned context derives from
    /// `ctx` and keeps `ctx`'s own deadline.
    async fn acquire_before(&self, ctx: &Context, deadline: Instant) -> Result<Context, LockError>;

    /// Release the resource held under `ctx` (the context `acquire` returned)
    async fn release(&self, ctx: &Context) -> Result<(), LockError>;
}

/// Hands out locks by resource key
pub trait LockProvider: Send + Sync + 'static {
    fn lock(&self, key: &str) -> Arc<dyn DistributedLock>;
}

/// In-process lock provider: one tokio mutex per key
#[derive(Clone, Default)]
pub struct LocalLockProvider {
    mutexes: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl LocalLockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with a live mutex
    pub fn key_count(&self) -> usize {
        self.mutexes.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl LockProvider for LocalLockProvider {
    fn lock(&self, key: &str) -> Arc<dyn DistributedLock> {
        let mutex = {
            let mut mutexes = self.mutexes.lock().unwrap_or_else(|e| e.into_inner());
            // Drop keys nobody references any more
            mutexes.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(
                mutexes
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };

        Arc::new(LocalLock {
            key: key.to_string(),
            mutex,
            held: Mutex::new(None),
        })
    }
}

struct Held {
    _guard: OwnedMutexGuard<()>,
    scope: CancelToken,
    holder: uuid::Uuid,
    acquired_at: Instant,
}

/// Lock backed by a process-local mutex
pub struct LocalLock {
    key: String,
    mutex: Arc<tokio::sync::Mutex<()>>,
    held: Mutex<Option<Held>>,
}

impl LocalLock {
    /// Wait for the mutex under `wait`, then scope the holder under `parent`
    async fn take(&self, wait: &Context, parent: &Context) -> Result<Context, LockError> {
        let guard = wait
            .run(Arc::clone(&self.mutex).lock_owned())
            .await
            .map_err(|e| LockError::from_context(&self.key, e))?;

        let scoped = parent.child();
        let holder = uuid::Uuid::new_v4();
        *self.held.lock().unwrap_or_else(|e| e.into_inner()) = Some(Held {
            _guard: guard,
            scope: scoped.token().clone(),
            holder,
            acquired_at: Instant::now(),
        });

        tracing::debug!(key = %self.key, %holder, "lock acquired");
        Ok(scoped)
    }
}

#[async_trait]
impl DistributedLock for LocalLock {
    fn key(&self) -> &str {
        &self.key
    }

    async fn acquire(&self, ctx: &Context) -> Result<Context, LockError> {
        self.take(ctx, ctx).await
    }

    async fn acquire_before(&self, ctx: &Context, deadline: Instant) -> Result<Context, LockError> {
        self.take(&ctx.with_deadline(deadline), ctx).await
    }

    async fn release(&self, ctx: &Context) -> Result<(), LockError> {
        let held = {
            let mut slot = self.held.lock().unwrap_or_else(|e| e.into_inner());
            match slot.as_ref() {
                Some(held) if held.scope.same_as(ctx.token()) => slot.take(),
                _ => None,
            }
        };

        debug_assert!(
            held.is_some(),
            "lock {} released without a held acquisition",
            self.key
        );

        let Some(held) = held else {
            tracing::error!(key = %self.key, "release without a held acquisition");
            return Err(LockError::NotHeld {
                key: self.key.clone(),
            });
        };

        held.scope.cancel();
        tracing::debug!(
            key = %self.key,
            holder = %held.holder,
            held_ms = held.acquired_at.elapsed().as_millis() as u64,
            "lock released"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;

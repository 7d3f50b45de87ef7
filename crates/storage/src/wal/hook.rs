// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery hooks replayed for uncommitted entries

use super::entry::LogEntry;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Failure reported by a recovery hook
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Replays one event type
///
/// Hooks may see an entry whose action already completed (crash after the
/// action, before the commit), so they must be safe to run again.
#[async_trait]
pub trait RecoveryHook: Send + Sync + 'static {
    async fn recover(&self, entry: &LogEntry) -> Result<(), HookError>;
}

/// Hook from an async function over the decoded JSON event
pub fn hook_fn<E, F, Fut>(f: F) -> Arc<dyn RecoveryHook>
where
    E: DeserializeOwned + Send + 'static,
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HookError>> + Send + 'static,
{
    Arc::new(FnHook {
        f,
        _event: PhantomData,
    })
}

struct FnHook<E, F> {
    f: F,
    _event: PhantomData<fn() -> E>,
}

#[async_trait]
impl<E, F, Fut> RecoveryHook for FnHook<E, F>
where
    E: DeserializeOwned + Send + 'static,
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HookError>> + Send + 'static,
{
    async fn recover(&self, entry: &LogEntry) -> Result<(), HookError> {
        let event: E = entry.decode()?;
        (self.f)(event).await
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL engine: logging, commit handles and recovery

use super::commit::Commit;
use super::entry::{entry_key, event_type_of_key, LogEntry, KEY_SEPARATOR};
use super::hook::RecoveryHook;
use crate::kv::{KvError, LogStore};
use chrono::Utc;
use corral_core::{join_failure, Context, ContextError, Observer};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors from WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("invalid event type {0:?}: must be non-empty and must not contain '/'")]
    InvalidEventType(String),

    #[error("failed to encode {event_type} event: {source}")]
    Encode {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode WAL entry {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store error: {0}")]
    Store(#[from] KvError),

    #[error(
        "{} of {} WAL entries failed recovery",
        .failures.len(),
        .failures.len() + .recovered
    )]
    Recovery {
        recovered: usize,
        failures: Vec<RecoveryFailure>,
    },

    #[error("recovery interrupted: {0}")]
    Cancelled(ContextError),
}

/// An entry that could not be recovered; it stays in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryFailure {
    pub event_type: String,
    pub key: String,
    pub error: String,
}

impl std::fmt::Display for RecoveryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.key, self.error)
    }
}

/// Outcome of a recovery pass in which every entry was replayed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub recovered: usize,
    pub by_event_type: BTreeMap<String, usize>,
}

/// Write-ahead log over a [`LogStore`]
pub struct Wal {
    store: Arc<LogStore>,
    hooks: RwLock<HashMap<String, Arc<dyn RecoveryHook>>>,
    observer: Observer,
}

impl Wal {
    pub fn new(store: Arc<LogStore>, observer: Observer) -> Self {
        Self {
            store,
            hooks: RwLock::new(HashMap::new()),
            observer,
        }
    }

    /// Open a fresh store at `path` and wrap it
    pub fn open(
        path: &Path,
        mode: u32,
        timeout: Duration,
        observer: Observer,
    ) -> Result<Self, WalError> {
        let store = LogStore::new();
        store.open(path, mode, timeout)?;
        Ok(Self::new(Arc::new(store), observer))
    }

    pub fn store(&self) -> &Arc<LogStore> {
        &self.store
    }

    /// Register the replay hook for an event type; the last registration wins
    pub fn register_recover_hook(&self, event_type: impl Into<String>, hook: Arc<dyn RecoveryHook>) {
        let event_type = event_type.into();
        let mut hooks = self.hooks.write().unwrap_or_else(|e| e.into_inner());
        if hooks.insert(event_type.clone(), hook).is_some() {
            tracing::warn!(event_type = %event_type, "recovery hook replaced");
        }
    }

    pub fn has_hook(&self, event_type: &str) -> bool {
        self.hooks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(event_type)
    }

    fn hook(&self, event_type: &str) -> Option<Arc<dyn RecoveryHook>> {
        self.hooks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(event_type)
            .cloned()
    }

    /// Durably record that an operation is starting
    ///
    /// The entry is on disk when this returns. If it fails, nothing was
    /// written and the operation must not proceed.
    pub fn log<E: Serialize>(&self, event_type: &str, event: &E) -> Result<Commit, WalError> {
        validate_event_type(event_type)?;

        let encode_err = |source| WalError::Encode {
            event_type: event_type.to_string(),
            source,
        };
        let payload = serde_json::to_vec(event).map_err(encode_err)?;
        let sequence = self.store.next_sequence()?;
        let entry = LogEntry {
            sequence,
            event_type: event_type.to_string(),
            payload,
            logged_at: Utc::now(),
        };
        let value = serde_json::to_vec(&entry).map_err(encode_err)?;
        let key = entry_key(event_type, sequence);

        self.store
            .put(key.as_bytes(), &value)
            .map_err(|e| self.observer.err("write WAL entry", WalError::Store(e)))?;

        tracing::debug!(event_type, sequence, "logged");
        Ok(Commit::new(key, Arc::clone(&self.store), self.observer.clone()))
    }

    /// Uncommitted entries in key order
    pub async fn pending(&self) -> Result<Vec<LogEntry>, WalError> {
        let mut entries = Vec::new();
        for item in self.store.scan(b"").collect().await? {
            let entry = serde_json::from_slice(&item.value).map_err(|source| WalError::Decode {
                key: String::from_utf8_lossy(&item.key).into_owned(),
                source,
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Replay every uncommitted entry through its hook
    ///
    /// Entries are visited grouped by event type, in sequence order within a
    /// type. An entry whose hook succeeds is deleted; any other entry stays
    /// for the next pass. Cancellation stops the pass between entries and
    /// leaves the remainder untouched.
    pub async fn recover(&self, ctx: &Context) -> Result<RecoveryReport, WalError> {
        let start = Instant::now();
        let mut report = RecoveryReport::default();
        let mut failures = Vec::new();
        let mut scan = self.store.scan(b"");

        while let Some(item) = scan.next().await {
            if let Some(err) = ctx.err() {
                scan.cancel();
                tracing::warn!(recovered = report.recovered, "recovery interrupted: {}", err);
                return Err(WalError::Cancelled(err));
            }

            let item = item?;
            let key = String::from_utf8_lossy(&item.key).into_owned();

            let entry: LogEntry = match serde_json::from_slice(&item.value) {
                Ok(entry) => entry,
                Err(e) => {
                    failures.push(RecoveryFailure {
                        event_type: event_type_of_key(&key).to_string(),
                        key,
                        error: format!("undecodable entry: {}", e),
                    });
                    continue;
                }
            };

            let Some(hook) = self.hook(&entry.event_type) else {
                failures.push(RecoveryFailure {
                    event_type: entry.event_type,
                    key,
                    error: "no recovery hook registered".to_string(),
                });
                continue;
            };

            // Own task so a panicking hook fails only its entry
            let task = tokio::spawn({
                let entry = entry.clone();
                async move { hook.recover(&entry).await }
            });
            let abort = task.abort_handle();
            let replayed = match ctx.run(task).await {
                Ok(replayed) => replayed,
                Err(err) => {
                    abort.abort();
                    scan.cancel();
                    tracing::warn!(key = %key, "recovery interrupted: {}", err);
                    return Err(WalError::Cancelled(err));
                }
            };

            let failure = match replayed {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(e) => Some(format!("hook {}", join_failure(e))),
            };
            if let Some(error) = failure {
                failures.push(RecoveryFailure {
                    event_type: entry.event_type,
                    key,
                    error,
                });
                continue;
            }

            if let Err(e) = self.store.delete(item.key.as_slice()) {
                failures.push(RecoveryFailure {
                    event_type: entry.event_type,
                    key,
                    error: format!("replayed but not removed: {}", e),
                });
                continue;
            }

            tracing::debug!(key = %key, "recovered");
            report.recovered += 1;
            *report.by_event_type.entry(entry.event_type).or_default() += 1;
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        for failure in &failures {
            tracing::warn!(event_type = %failure.event_type, key = %failure.key, "recovery failed: {}", failure.error);
        }

        if failures.is_empty() {
            tracing::info!(recovered = report.recovered, elapsed_ms, "recovery complete");
            Ok(report)
        } else {
            let err = WalError::Recovery {
                recovered: report.recovered,
                failures,
            };
            Err(self.observer.err("WAL recovery", err))
        }
    }

    pub fn close(&self) -> Result<(), WalError> {
        Ok(self.store.close()?)
    }
}

fn validate_event_type(event_type: &str) -> Result<(), WalError> {
    if event_type.is_empty() || event_type.contains(KEY_SEPARATOR) {
        return Err(WalError::InvalidEventType(event_type.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;

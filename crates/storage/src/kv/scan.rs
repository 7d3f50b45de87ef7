// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellable prefix scans
//!
//! A scan streams a point-in-time snapshot from a background producer. The
//! producer races every send against cancellation, so a consumer that stops
//! reading early can abandon the scan without leaking the producer.

use super::store::KvError;
use corral_core::CancelToken;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One key/value pair yielded by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Ordered, finite stream of entries
///
/// An `Err` item ends the stream. Dropping the scan cancels it.
pub struct Scan {
    rx: mpsc::Receiver<Result<ScanEntry, KvError>>,
    cancel: CancelToken,
    producer: Option<JoinHandle<()>>,
}

impl Scan {
    pub(crate) fn spawn(snapshot: Result<Vec<ScanEntry>, KvError>) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let cancel = CancelToken::new();

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                // Capacity 1 is free, so this cannot fail
                let _ = tx.try_send(Err(KvError::NoRuntime));
                return Self {
                    rx,
                    cancel,
                    producer: None,
                };
            }
        };

        let exit = cancel.clone();
        let producer = handle.spawn(async move {
            let entries = match snapshot {
                Ok(entries) => entries,
                Err(err) => {
                    tokio::select! {
                        _ = exit.cancelled() => {}
                        _ = tx.send(Err(err)) => {}
                    }
                    return;
                }
            };

            for entry in entries {
                tokio::select! {
                    biased;
                    _ = exit.cancelled() => return,
                    sent = tx.send(Ok(entry)) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Self {
            rx,
            cancel,
            producer: Some(producer),
        }
    }

    /// Next entry, or `None` once the scan is exhausted or cancelled
    pub async fn next(&mut self) -> Option<Result<ScanEntry, KvError>> {
        self.rx.recv().await
    }

    /// Stop the producer; entries already buffered may still be read
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Detached handle that cancels this scan
    pub fn canceller(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Whether the background producer has exited
    pub fn is_finished(&self) -> bool {
        self.producer.as_ref().map_or(true, |p| p.is_finished())
    }

    /// Drain the scan, stopping at the first error
    pub async fn collect(mut self) -> Result<Vec<ScanEntry>, KvError> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next().await {
            entries.push(entry?);
        }
        Ok(entries)
    }
}

impl Drop for Scan {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;

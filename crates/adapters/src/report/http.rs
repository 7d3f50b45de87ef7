// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error reporter posting JSON to an HTTP endpoint

use corral_core::ErrorReporter;
use serde::Serialize;
use std::sync::{mpsc, Mutex};
use std::thread::JoinHandle;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Serialize)]
struct Report<'a> {
    source: &'a str,
    message: &'a str,
    reported_at_ms: u64,
}

/// Posts each report from a background thread so callers never block on
/// the network. Delivery is best effort; failures are logged and dropped.
pub struct HttpErrorReporter {
    tx: Mutex<Option<mpsc::Sender<String>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl HttpErrorReporter {
    /// Start the delivery thread
    pub fn spawn(endpoint: impl Into<String>, source: impl Into<String>) -> std::io::Result<Self> {
        let endpoint = endpoint.into();
        let source = source.into();
        let (tx, rx) = mpsc::channel::<String>();

        let worker = std::thread::Builder::new()
            .name("error-reporter".to_string())
            .spawn(move || {
                for message in rx {
                    if let Err(e) = post(&endpoint, &source, &message) {
                        tracing::warn!(endpoint = %endpoint, error = %e, "error report not delivered");
                    }
                }
            })?;

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Deliver queued reports, then stop the thread
    ///
    /// Reports made after this are dropped. Closing twice is a no-op.
    pub fn close(&self) {
        self.tx.lock().unwrap_or_else(|e| e.into_inner()).take();
        let worker = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                tracing::warn!("error reporter thread panicked");
            }
        }
    }
}

fn post(endpoint: &str, source: &str, message: &str) -> Result<(), String> {
    let reported_at_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    let body = serde_json::to_string(&Report {
        source,
        message,
        reported_at_ms,
    })
    .map_err(|e| e.to_string())?;

    ureq::post(endpoint)
        .header("Content-Type", "application/json")
        .send(body.as_str())
        .map_err(|e| e.to_string())?;
    Ok(())
}

impl ErrorReporter for HttpErrorReporter {
    fn report(&self, message: &str) {
        let sent = self
            .tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|tx| tx.send(message.to_string()).is_ok())
            .unwrap_or(false);
        if !sent {
            tracing::warn!("error reporter stopped, report dropped");
        }
    }
}

impl Drop for HttpErrorReporter {
    fn drop(&mut self) {
        // Closing the channel lets the thread drain and exit on its own
        self.tx.get_mut().unwrap_or_else(|e| e.into_inner()).take();
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;

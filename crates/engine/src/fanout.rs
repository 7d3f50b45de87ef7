// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded fan-out with streamed fan-in
//!
//! A coordinator task admits units as concurrency permits free up, runs each
//! in its own task and forwards every result to the stream. Once all units
//! have joined it runs the settle step and only then drops the last sender,
//! which closes the stream.

use corral_core::{join_failure, OperationResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;

/// Per-unit results of one operation, in completion order
///
/// Yields exactly one result per unit, then `None`. Dropping the stream
/// early does not stall the operation.
#[derive(Debug)]
pub struct ResultStream {
    rx: mpsc::Receiver<OperationResult>,
}

impl ResultStream {
    /// Stream for an operation with no units
    pub(crate) fn closed() -> Self {
        let (_, rx) = mpsc::channel(1);
        Self { rx }
    }

    pub async fn next(&mut self) -> Option<OperationResult> {
        self.rx.recv().await
    }

    /// Drain every result; returns once the operation has settled
    pub async fn collect(mut self) -> Vec<OperationResult> {
        let mut results = Vec::new();
        while let Some(result) = self.next().await {
            results.push(result);
        }
        results
    }
}

/// Limits for one fan-out
#[derive(Debug, Clone, Copy)]
pub(crate) struct FanOutLimits {
    pub max_concurrency: usize,
    pub buffer: usize,
}

/// Run `work` once per `(target, unit)` and stream the results
///
/// `settle` runs after every unit has reported and before the stream closes.
pub(crate) fn run<T, F, Fut, S>(
    units: Vec<(String, T)>,
    limits: FanOutLimits,
    work: F,
    settle: S,
) -> ResultStream
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = OperationResult> + Send + 'static,
    S: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(limits.buffer.max(1));
    let permits = Arc::new(Semaphore::new(limits.max_concurrency.max(1)));
    let work = Arc::new(work);

    let coordinator = async move {
        let start = Instant::now();
        let total = units.len();
        let mut workers = JoinSet::new();

        for (target, unit) in units {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };
            let tx = tx.clone();
            let work = Arc::clone(&work);

            workers.spawn(
                async move {
                    let _permit = permit;
                    // Separate task so a panicking unit still reports
                    let result = match tokio::spawn((*work)(unit)).await {
                        Ok(result) => result,
                        Err(e) => {
                            tracing::error!(unit = %target, error = %e, "unit worker failed");
                            OperationResult::failed(target, worker_failure(e))
                        }
                    };
                    let success = result.success;
                    if tx.send(result).await.is_err() {
                        tracing::debug!("result stream dropped");
                    }
                    success
                }
                .in_current_span(),
            );
        }

        let mut failed = 0;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(true) => {}
                Ok(false) => failed += 1,
                Err(e) => {
                    failed += 1;
                    tracing::error!(error = %e, "result forwarder failed");
                }
            }
        }

        settle.await;
        drop(tx);

        tracing::info!(
            units = total,
            failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "operation settled"
        );
    };

    tokio::spawn(coordinator.in_current_span());
    ResultStream { rx }
}

fn worker_failure(err: JoinError) -> String {
    format!("worker {}", join_failure(err))
}

#[cfg(test)]
#[path = "fanout_tests.rs"]
mod tests;

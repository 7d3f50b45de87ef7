// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for engine operations

use corral_adapters::ClusterError;
use corral_core::LockError;
use corral_storage::WalError;
use thiserror::Error;

/// Failures that stop an operation before any unit runs
///
/// Per-unit failures are never returned here; they arrive as failed
/// results on the operation's stream.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("resource not found: {0}")]
    NotFound(ClusterError),
    #[error("cluster store error: {0}")]
    Cluster(ClusterError),
    #[error("lock error: {0}")]
    Lock(#[from] LockError),
    #[error("wal error: {0}")]
    Wal(#[from] WalError),
}

impl From<ClusterError> for EngineError {
    fn from(err: ClusterError) -> Self {
        match err {
            ClusterError::PodNotFound(_) | ClusterError::NodeNotFound { .. } => {
                EngineError::NotFound(err)
            }
            ClusterError::Unavailable(_) => EngineError::Cluster(err),
        }
    }
}

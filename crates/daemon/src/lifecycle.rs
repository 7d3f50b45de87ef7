// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, recovery, shutdown.

use crate::config::{Config, ConfigError, LogConfig};
use corral_adapters::{ClusterStore, HttpErrorReporter, NoOpClusterStore, TracedClusterStore};
use corral_core::{Context, LocalLockProvider, Observer};
use corral_engine::{Engine, EngineDeps};
use corral_storage::{Wal, WalError};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

/// Cluster store used when no inventory is configured
pub type DefaultCluster = TracedClusterStore<NoOpClusterStore>;

/// Errors that stop the daemon from starting or stopping cleanly
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("WAL error: {0}")]
    Wal(#[from] WalError),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store open task failed: {0}")]
    OpenTask(#[from] tokio::task::JoinError),
}

/// Running daemon
pub struct Daemon<C: ClusterStore = DefaultCluster> {
    pub config: Config,
    pub engine: Engine<C, LocalLockProvider>,
    wal: Arc<Wal>,
    reporting: Reporting,
    /// When the daemon started
    pub start_time: Instant,
}

impl<C: ClusterStore> Daemon<C> {
    /// Close the store file, releasing its lock for the next process, then
    /// deliver any queued error reports
    pub fn shutdown(self) -> Result<(), LifecycleError> {
        info!("shutting down daemon");
        let closed = self.wal.close();
        self.reporting.close();
        closed?;
        info!(
            uptime_ms = self.start_time.elapsed().as_millis() as u64,
            "daemon shutdown complete"
        );
        Ok(())
    }
}

/// Where errors flagged for reporting go for the life of the daemon
pub struct Reporting {
    observer: Observer,
    http: Option<Arc<HttpErrorReporter>>,
}

impl Reporting {
    /// Report to the configured endpoint, if any
    pub fn from_config(config: &LogConfig) -> Result<Self, LifecycleError> {
        let Some(endpoint) = &config.error_reporting_endpoint else {
            return Ok(Self::noop());
        };
        let reporter = Arc::new(HttpErrorReporter::spawn(endpoint.as_str(), "corrald")?);
        Ok(Self {
            observer: Observer::new(reporter.clone()),
            http: Some(reporter),
        })
    }

    pub fn noop() -> Self {
        Self::from(Observer::noop())
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    /// Flush queued reports to the endpoint
    pub fn close(&self) {
        if let Some(http) = &self.http {
            http.close();
        }
    }
}

impl From<Observer> for Reporting {
    fn from(observer: Observer) -> Self {
        Self {
            observer,
            http: None,
        }
    }
}

/// Start with the default (empty) cluster inventory
pub async fn startup(config: &Config, reporting: Reporting) -> Result<Daemon, LifecycleError> {
    startup_with(config, TracedClusterStore::new(NoOpClusterStore::new()), reporting).await
}

/// Open the WAL store, build the engine and run startup recovery
///
/// Entries that fail to recover are reported and kept for the next start;
/// they do not prevent startup.
pub async fn startup_with<C: ClusterStore>(
    config: &Config,
    cluster: C,
    reporting: Reporting,
) -> Result<Daemon<C>, LifecycleError> {
    let start_time = Instant::now();
    let observer = reporting.observer().clone();

    // Waiting on a contended store file sleeps the thread
    let wal = {
        let path = config.wal_file.clone();
        let (mode, timeout) = (config.wal_file_mode, config.wal_open_timeout);
        let observer = observer.clone();
        tokio::task::spawn_blocking(move || Wal::open(&path, mode, timeout, observer)).await??
    };
    let wal = Arc::new(wal);
    info!(path = %config.wal_file.display(), "WAL store opened");

    let engine = Engine::new(
        EngineDeps {
            cluster,
            locks: LocalLockProvider::new(),
            wal: Arc::clone(&wal),
            observer,
        },
        config.engine.clone(),
    );

    match engine.recover(&Context::background()).await {
        Ok(report) => info!(recovered = report.recovered, "startup recovery complete"),
        Err(e) => warn!(error = %e, "startup recovery incomplete; remaining entries kept"),
    }

    info!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "daemon started"
    );

    Ok(Daemon {
        config: config.clone(),
        engine,
        wal,
        reporting,
        start_time,
    })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Corral daemon (corrald)
//!
//! Opens the WAL store, replays interrupted operations and holds the store
//! until SIGTERM or SIGINT.

use std::path::PathBuf;
use std::process::ExitCode;

use corral_daemon::{lifecycle, setup_logging, Config, Reporting};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

const USAGE: &str = "usage: corrald <config.toml>";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("corrald: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let config_path = match args.as_slice() {
        [_, path] => PathBuf::from(path),
        _ => return Err(USAGE.into()),
    };

    let config = Config::load(&config_path)?;
    let log_guard = setup_logging(&config.log)?;

    info!(config = %config_path.display(), "starting corrald");

    let reporting = Reporting::from_config(&config.log)?;
    let daemon = match lifecycle::startup(&config, reporting).await {
        Ok(d) => d,
        Err(e) => {
            error!("failed to start daemon: {}", e);
            // Flush before the error reaches stderr
            drop(log_guard);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(wal = %config.wal_file.display(), "daemon ready");
    println!("READY");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    daemon.shutdown()?;
    info!("daemon stopped");
    Ok(())
}

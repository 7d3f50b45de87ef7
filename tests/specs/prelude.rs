//! Shared helpers for scenario tests

use corral_core::Observer;
use corral_storage::Wal;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub const OPEN_TIMEOUT: Duration = Duration::from_secs(1);

/// Temp directory holding one store file
pub struct StoreDir {
    _dir: TempDir,
    pub path: PathBuf,
}

impl StoreDir {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corral").join("wal.db");
        Self { _dir: dir, path }
    }

    pub fn open_wal(&self) -> Wal {
        open_wal(&self.path)
    }
}

pub fn open_wal(path: &Path) -> Wal {
    Wal::open(path, 0o600, OPEN_TIMEOUT, Observer::noop()).unwrap()
}

pub fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-file ordered key/value store
//!
//! The file is an append-only sequence of checksummed records. Opening it
//! replays the records into an ordered in-memory index; every mutation
//! appends one record and fsyncs before touching the index.

use super::record::{Frame, Record};
use super::scan::{Scan, ScanEntry};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Name of the root namespace written as the file header
pub const DEFAULT_ROOT_BUCKET: &str = "root";

/// Permission bits for a newly created store file
pub const DEFAULT_FILE_MODE: u32 = 0o600;

/// Poll interval while another process holds the file lock
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Compact on open once the file holds this many records...
const COMPACT_MIN_RECORDS: u64 = 1024;
/// ...and at least this many records per live key
const COMPACT_RATIO: u64 = 4;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum KvError {
    #[error("failed to open store at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("timed out after {timeout:?} waiting for the lock on {path}")]
    OpenTimeout { path: PathBuf, timeout: Duration },
    #[error("store at {path} has root bucket {found:?}, expected {expected:?}")]
    InvalidBucket {
        path: PathBuf,
        found: String,
        expected: String,
    },
    #[error("store is not open")]
    Closed,
    #[error("store was never opened")]
    NeverOpened,
    #[error("scan requires a tokio runtime")]
    NoRuntime,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
struct OpenParams {
    path: PathBuf,
    mode: u32,
    timeout: Duration,
}

#[derive(Default)]
struct State {
    params: Option<OpenParams>,
    db: Option<Db>,
}

struct Db {
    path: PathBuf,
    mode: u32,
    /// Append handle, holds the exclusive lock
    file: File,
    /// Byte length of the valid file contents
    len: u64,
    /// Records in the file, live or dead
    records: u64,
    sequence: u64,
    index: BTreeMap<Vec<u8>, Vec<u8>>,
}

/// Embedded ordered key/value store
pub struct LogStore {
    root_bucket: String,
    state: Mutex<State>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::with_root_bucket(DEFAULT_ROOT_BUCKET)
    }

    /// Store whose root namespace has a custom name
    pub fn with_root_bucket(name: impl Into<String>) -> Self {
        Self {
            root_bucket: name.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// Open or create the store file
    ///
    /// Waits up to `timeout` for another process to release the file; a zero
    /// timeout waits indefinitely. An already open store is closed first.
    pub fn open(&self, path: &Path, mode: u32, timeout: Duration) -> Result<(), KvError> {
        let mut state = self.lock_state();
        if let Some(db) = state.db.take() {
            db.close();
        }

        let params = OpenParams {
            path: path.to_path_buf(),
            mode,
            timeout,
        };
        state.db = Some(Db::open(&params, &self.root_bucket)?);
        state.params = Some(params);
        Ok(())
    }

    /// Close and open again with the parameters of the last `open`
    pub fn reopen(&self) -> Result<(), KvError> {
        let mut state = self.lock_state();
        let params = state.params.clone().ok_or(KvError::NeverOpened)?;
        if let Some(db) = state.db.take() {
            db.close();
        }
        state.db = Some(Db::open(&params, &self.root_bucket)?);
        Ok(())
    }

    /// Release the file and its lock; closing a closed store does nothing
    pub fn close(&self) -> Result<(), KvError> {
        if let Some(db) = self.lock_state().db.take() {
            db.close();
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.lock_state().db.is_some()
    }

    /// Path of the open store file
    pub fn path(&self) -> Option<PathBuf> {
        self.lock_state().db.as_ref().map(|db| db.path.clone())
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        self.with_db(|db| {
            db.append(Record::Put {
                key: key.to_vec(),
                value: value.to_vec(),
            })?;
            db.index.insert(key.to_vec(), value.to_vec());
            Ok(())
        })
    }

    /// Value stored under `key`; empty when the key is missing
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>, KvError> {
        self.with_db(|db| Ok(db.index.get(key).cloned().unwrap_or_default()))
    }

    /// Whether `key` is present, even with an empty value
    pub fn contains(&self, key: &[u8]) -> Result<bool, KvError> {
        self.with_db(|db| Ok(db.index.contains_key(key)))
    }

    /// Delete `key`; deleting a missing key is not an error
    pub fn delete(&self, key: &[u8]) -> Result<(), KvError> {
        self.with_db(|db| {
            if !db.index.contains_key(key) {
                return Ok(());
            }
            db.append(Record::Delete { key: key.to_vec() })?;
            db.index.remove(key);
            Ok(())
        })
    }

    /// Allocate the next sequence number (the first is 1)
    pub fn next_sequence(&self) -> Result<u64, KvError> {
        self.with_db(|db| {
            let value = db.sequence + 1;
            db.append(Record::Sequence { value })?;
            db.sequence = value;
            Ok(value)
        })
    }

    /// Number of live keys
    pub fn len(&self) -> Result<usize, KvError> {
        self.with_db(|db| Ok(db.index.len()))
    }

    pub fn is_empty(&self) -> Result<bool, KvError> {
        Ok(self.len()? == 0)
    }

    /// Stream every entry whose key starts with `prefix`, in key order
    ///
    /// The entries are a snapshot taken now; later writes are not observed.
    /// Must be called from within a tokio runtime.
    pub fn scan(&self, prefix: &[u8]) -> Scan {
        let snapshot = self.with_db(|db| {
            Ok(db
                .index
                .range(prefix.to_vec()..)
                .take_while(|(key, _)| key.starts_with(prefix))
                .map(|(key, value)| ScanEntry {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect())
        });
        Scan::spawn(snapshot)
    }

    /// Rewrite the file to hold only live entries and the sequence
    pub fn compact(&self) -> Result<(), KvError> {
        let root_bucket = self.root_bucket.clone();
        self.with_db(|db| db.compact(&root_bucket))
    }

    fn with_db<T>(&self, f: impl FnOnce(&mut Db) -> Result<T, KvError>) -> Result<T, KvError> {
        let mut state = self.lock_state();
        let db = state.db.as_mut().ok_or(KvError::Closed)?;
        f(db)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Db {
    fn open(params: &OpenParams, root_bucket: &str) -> Result<Self, KvError> {
        let open_err = |source| KvError::Open {
            path: params.path.clone(),
            source,
        };

        if let Some(parent) = params.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(open_err)?;
            }
        }

        let file = lock_file(params)?;
        let mut db = Self {
            path: params.path.clone(),
            mode: params.mode,
            file,
            len: 0,
            records: 0,
            sequence: 0,
            index: BTreeMap::new(),
        };

        let bucket = db.replay().map_err(open_err)?;
        match bucket {
            None => {
                db.append(Record::Bucket {
                    name: root_bucket.to_string(),
                })?;
            }
            Some(found) if found != root_bucket => {
                return Err(KvError::InvalidBucket {
                    path: params.path.clone(),
                    found,
                    expected: root_bucket.to_string(),
                });
            }
            Some(_) => {}
        }

        let live = db.index.len() as u64 + 2;
        if db.records >= COMPACT_MIN_RECORDS && db.records >= live * COMPACT_RATIO {
            tracing::info!(
                path = %db.path.display(),
                records = db.records,
                live_keys = db.index.len(),
                "compacting store"
            );
            db.compact(root_bucket)?;
        }

        tracing::debug!(
            path = %db.path.display(),
            keys = db.index.len(),
            sequence = db.sequence,
            "store opened"
        );
        Ok(db)
    }

    /// Load records into the index; returns the root bucket name if present
    ///
    /// Stops at the first invalid or unterminated record and truncates the
    /// file there. Safe because the caller holds the exclusive file lock.
    fn replay(&mut self) -> Result<Option<String>, io::Error> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut buf = Vec::new();
        let mut bucket = None;
        let mut position: u64 = 0;
        let mut line_number: u64 = 0;
        let mut corrupted_at = None;

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf)?;
            if read == 0 {
                break;
            }
            line_number += 1;

            let Some(line) = buf.strip_suffix(b"\n") else {
                corrupted_at = Some(line_number);
                break;
            };

            if line.iter().all(u8::is_ascii_whitespace) {
                position += read as u64;
                continue;
            }

            let frame = std::str::from_utf8(line).ok().and_then(Frame::from_line);
            let Some(frame) = frame else {
                corrupted_at = Some(line_number);
                break;
            };

            match frame.record {
                Record::Bucket { name } => bucket = Some(name),
                Record::Put { key, value } => {
                    self.index.insert(key, value);
                }
                Record::Delete { key } => {
                    self.index.remove(&key);
                }
                Record::Sequence { value } => self.sequence = self.sequence.max(value),
            }
            self.records += 1;
            position += read as u64;
        }

        if let Some(line) = corrupted_at {
            let file_len = self.file.metadata()?.len();
            tracing::warn!(
                path = %self.path.display(),
                line,
                truncated_bytes = file_len.saturating_sub(position),
                "store corruption detected, truncating at last valid record"
            );
            self.file.set_len(position)?;
            self.file.sync_all()?;
        }
        self.len = position;

        Ok(bucket)
    }

    fn append(&mut self, record: Record) -> Result<(), KvError> {
        let line = Frame::new(record).to_line()?;

        let written = self
            .file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.sync_data());
        if let Err(e) = written {
            // Cut off a partial write so later records stay reachable on replay
            let _ = self.file.set_len(self.len);
            return Err(e.into());
        }

        self.len += line.len() as u64;
        self.records += 1;
        Ok(())
    }

    fn compact(&mut self, root_bucket: &str) -> Result<(), KvError> {
        let tmp_path = self.path.with_extension("compact");
        if tmp_path.exists() {
            // Leftover from an interrupted compaction
            std::fs::remove_file(&tmp_path)?;
        }
        let mut tmp = create_file(&tmp_path, self.mode)?;
        tmp.try_lock_exclusive()?;

        let mut records = vec![
            Record::Bucket {
                name: root_bucket.to_string(),
            },
            Record::Sequence {
                value: self.sequence,
            },
        ];
        records.extend(self.index.iter().map(|(key, value)| Record::Put {
            key: key.clone(),
            value: value.clone(),
        }));

        let mut len = 0u64;
        for record in &records {
            let line = Frame::new(record.clone()).to_line()?;
            tmp.write_all(line.as_bytes())?;
            len += line.len() as u64;
        }
        tmp.sync_all()?;

        std::fs::rename(&tmp_path, &self.path)?;
        sync_parent_dir(&self.path)?;

        // Both files are locked by us until the old handle drops here
        let old = std::mem::replace(&mut self.file, tmp);
        let _ = old.unlock();

        self.len = len;
        self.records = records.len() as u64;
        Ok(())
    }

    fn close(self) {
        let _ = self.file.unlock();
        tracing::debug!(path = %self.path.display(), "store closed");
    }
}

fn create_file(path: &Path, mode: u32) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true).read(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    options.open(path)
}

/// Open the store file and take its exclusive lock
fn lock_file(params: &OpenParams) -> Result<File, KvError> {
    let started = Instant::now();
    loop {
        let file = create_file(&params.path, params.mode).map_err(|source| {
            KvError::Open {
                path: params.path.clone(),
                source,
            }
        })?;

        match file.try_lock_exclusive() {
            // Compaction may have swapped the file while we waited on the old one
            Ok(()) if is_current_file(&file, &params.path) => return Ok(file),
            Ok(()) => {
                let _ = file.unlock();
                continue;
            }
            Err(_) => {}
        }

        let elapsed = started.elapsed();
        if !params.timeout.is_zero() && elapsed >= params.timeout {
            return Err(KvError::OpenTimeout {
                path: params.path.clone(),
                timeout: params.timeout,
            });
        }
        let remaining = if params.timeout.is_zero() {
            LOCK_RETRY_INTERVAL
        } else {
            params.timeout - elapsed
        };
        std::thread::sleep(remaining.min(LOCK_RETRY_INTERVAL));
    }
}

#[cfg(unix)]
fn is_current_file(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (file.metadata(), std::fs::metadata(path)) {
        (Ok(held), Ok(current)) => held.dev() == current.dev() && held.ino() == current.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_current_file(_file: &File, _path: &Path) -> bool {
    true
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => File::open(parent)?.sync_all(),
        _ => Ok(()),
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

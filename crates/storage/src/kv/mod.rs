// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Embedded ordered key/value store backed by a single file
//!
//! ## Durability Guarantees
//!
//! - Every mutation is one checksummed record, fsync'd before returning
//! - Torn trailing records (crash during append) are cut off on open
//! - An exclusive advisory lock keeps a second process off the file

mod record;
mod scan;
mod store;

pub use scan::{Scan, ScanEntry};
pub use store::{KvError, LogStore, DEFAULT_FILE_MODE, DEFAULT_ROOT_BUCKET};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable storage for in-flight operations
//!
//! ```text
//! Wal::log(event) → LogEntry → LogStore (single file, ordered keys)
//!                                   ↓ crash
//!                   Wal::recover → hook(payload) → delete entry
//! ```

pub mod kv;
pub mod wal;

pub use kv::{KvError, LogStore, Scan, ScanEntry};
pub use wal::{
    hook_fn, Commit, HookError, LogEntry, RecoveryFailure, RecoveryHook, RecoveryReport, Wal,
    WalError,
};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-Ahead Log (WAL) for in-flight operations
//!
//! An entry exists only while an operation's outcome is uncertain: it is
//! written before the operation acts and deleted by its [`Commit`] once the
//! operation is known to be complete. Entries are recovery markers, not an
//! audit trail.
//!
//! ## Architecture
//!
//! ```text
//! Wal::log(type, event) → LogEntry → "<type>/<sequence>" → LogStore
//!                                                           ↓ restart
//! Wal::recover → scan (grouped by type) → hook(entry) → delete on success
//! ```

mod commit;
mod entry;
mod hook;
mod log;

pub use commit::Commit;
pub use entry::LogEntry;
pub use hook::{hook_fn, HookError, RecoveryHook};
pub use log::{RecoveryFailure, RecoveryReport, Wal, WalError};

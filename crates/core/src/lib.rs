// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! corral-core: shared building blocks for the corral control core
//!
//! This crate provides:
//! - Cancellable, deadline-bounded contexts for suspending operations
//! - Named resource locks (one exclusion per resource key)
//! - The injected observability handle used by storage and engine
//! - Per-unit operation results streamed back to callers

pub mod context;
pub mod coordination;
pub mod observe;
pub mod result;
pub mod task;

pub use context::{CancelToken, Context, ContextError};
pub use coordination::{
    node_key, DistributedLock, LocalLock, LocalLockProvider, LockError, LockProvider,
};
pub use observe::{ErrorReporter, NoOpReporter, Observer};
pub use result::OperationResult;
pub use task::join_failure;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Corral orchestration engine
//!
//! Each operation resolves its nodes, locks them, optionally logs a WAL
//! entry, fans out one worker per unit and streams one result per unit:
//!
//! ```text
//! resolve → lock → wal.log → workers ─┬─→ ResultStream
//!                                      └─ join → commit → release → close
//! ```

mod config;
mod engine;
mod error;
mod fanout;
mod image;
mod locks;

pub use config::EngineConfig;
pub use engine::{Engine, EngineDeps};
pub use error::EngineError;
pub use fanout::ResultStream;
pub use image::{RemoveImageEvent, REMOVE_IMAGE_EVENT};

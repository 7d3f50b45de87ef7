// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-node container engine drivers

mod noop;

pub use noop::NoOpEngineDriver;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{DriverCall, FakeEngineDriver};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from engine driver calls
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no such image: {0}")]
    NoSuchImage(String),
    #[error("image {image} is in use: {reason}")]
    Conflict { image: String, reason: String },
    #[error("driver request failed: {0}")]
    RequestFailed(String),
}

/// Options for image removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveImageOptions {
    /// Remove even if containers reference the image
    pub force: bool,
    /// Also delete untagged parent layers
    pub prune_children: bool,
}

impl Default for RemoveImageOptions {
    fn default() -> Self {
        Self {
            force: false,
            prune_children: true,
        }
    }
}

/// One step reported by an image removal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageDeleteItem {
    /// A tag was removed from the image
    Untagged(String),
    /// An image layer was deleted
    Deleted(String),
}

impl ImageDeleteItem {
    /// Human-readable line for result messages
    pub fn message(&self) -> String {
        match self {
            ImageDeleteItem::Untagged(reference) => format!("Untagged: {}", reference),
            ImageDeleteItem::Deleted(id) => format!("Deleted: {}", id),
        }
    }
}

/// Container engine on one node
#[async_trait]
pub trait EngineDriver: Clone + Send + Sync + 'static {
    /// Remove an image by reference or id
    async fn remove_image(
        &self,
        image: &str,
        opts: RemoveImageOptions,
    ) -> Result<Vec<ImageDeleteItem>, DriverError>;

    /// Pull an image, returning progress lines
    async fn pull_image(&self, image: &str) -> Result<Vec<String>, DriverError>;
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op engine driver for nodes without a reachable engine.

use super::{DriverError, EngineDriver, ImageDeleteItem, RemoveImageOptions};
use async_trait::async_trait;

/// Engine driver that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpEngineDriver;

impl NoOpEngineDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EngineDriver for NoOpEngineDriver {
    async fn remove_image(
        &self,
        _image: &str,
        _opts: RemoveImageOptions,
    ) -> Result<Vec<ImageDeleteItem>, DriverError> {
        Ok(Vec::new())
    }

    async fn pull_image(&self, _image: &str) -> Result<Vec<String>, DriverError> {
        Ok(Vec::new())
    }
}

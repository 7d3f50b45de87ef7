// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Image units: per-image removal, per-node pulls and removal replay

use corral_adapters::{
    ClusterStore, DriverError, EngineDriver, ImageDeleteItem, RemoveImageOptions,
};
use corral_core::{Context, OperationResult};
use corral_storage::HookError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// WAL event type for image removal
pub const REMOVE_IMAGE_EVENT: &str = "remove-image";

/// Logged before images are removed from a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveImageEvent {
    pub pod: String,
    pub node: String,
    pub images: Vec<String>,
}

/// Remove one image; the result carries one message per driver item
pub(crate) async fn remove_one<D: EngineDriver>(
    driver: D,
    image: String,
    ctx: Context,
    timeout: Duration,
) -> OperationResult {
    let call = ctx
        .with_timeout(timeout)
        .run(driver.remove_image(&image, RemoveImageOptions::default()))
        .await;

    match call {
        Ok(Ok(items)) => {
            let messages = items.iter().map(ImageDeleteItem::message).collect();
            OperationResult::succeeded(image, messages)
        }
        Ok(Err(e)) => OperationResult::failed(image, e.to_string()),
        Err(e) => OperationResult::failed(image, format!("driver call aborted: {}", e)),
    }
}

/// Pull `image` onto one node; the result carries the progress lines
pub(crate) async fn pull_one<D: EngineDriver>(
    driver: D,
    node: String,
    image: String,
    ctx: Context,
    timeout: Duration,
) -> OperationResult {
    match ctx.with_timeout(timeout).run(driver.pull_image(&image)).await {
        Ok(Ok(progress)) => OperationResult::succeeded(node, progress),
        Ok(Err(e)) => OperationResult::failed(node, e.to_string()),
        Err(e) => OperationResult::failed(node, format!("driver call aborted: {}", e)),
    }
}

/// Re-issue a logged removal
///
/// Images that are already gone count as removed, so replaying a removal
/// that finished before the crash succeeds.
pub(crate) async fn replay_remove_image<C: ClusterStore>(
    cluster: C,
    event: RemoveImageEvent,
    timeout: Duration,
) -> Result<(), HookError> {
    let node = cluster.get_node(&event.pod, &event.node).await?;
    let mut failures = Vec::new();

    for image in &event.images {
        let call = tokio::time::timeout(
            timeout,
            node.driver.remove_image(image, RemoveImageOptions::default()),
        )
        .await;
        match call {
            Ok(Ok(items)) => tracing::info!(image = %image, items = items.len(), "replayed removal"),
            Ok(Err(DriverError::NoSuchImage(_))) => tracing::debug!(image = %image, "already removed"),
            Ok(Err(e)) => failures.push(format!("{}: {}", image, e)),
            Err(_) => failures.push(format!("{}: timed out after {:?}", image, timeout)),
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        let message = format!(
            "removal replay failed on {}/{}: {}",
            event.pod,
            event.node,
            failures.join("; ")
        );
        Err(message.into())
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;

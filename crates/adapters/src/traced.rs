// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::cluster::{ClusterError, ClusterStore, NodeHandle};
use crate::driver::{DriverError, EngineDriver, ImageDeleteItem, RemoveImageOptions};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any EngineDriver
#[derive(Clone, Debug)]
pub struct TracedEngineDriver<D> {
    node: String,
    inner: D,
}

impl<D> TracedEngineDriver<D> {
    pub fn new(node: impl Into<String>, inner: D) -> Self {
        Self {
            node: node.into(),
            inner,
        }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

fn check_image_ref(image: &str) -> Result<(), DriverError> {
    if image.trim().is_empty() {
        tracing::error!("empty image reference");
        return Err(DriverError::RequestFailed(
            "empty image reference".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl<D: EngineDriver> EngineDriver for TracedEngineDriver<D> {
    async fn remove_image(
        &self,
        image: &str,
        opts: RemoveImageOptions,
    ) -> Result<Vec<ImageDeleteItem>, DriverError> {
        let span = tracing::info_span!("driver.remove_image", node = %self.node, image);
        async {
            tracing::info!(force = opts.force, prune_children = opts.prune_children, "removing");
            check_image_ref(image)?;

            let start = std::time::Instant::now();
            let result = self.inner.remove_image(image, opts).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(items) => tracing::info!(items = items.len(), elapsed_ms, "image removed"),
                // Already gone is routine during recovery
                Err(DriverError::NoSuchImage(_)) => {
                    tracing::warn!(elapsed_ms, "no such image")
                }
                Err(e) => tracing::error!(elapsed_ms, error = %e, "remove failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn pull_image(&self, image: &str) -> Result<Vec<String>, DriverError> {
        let span = tracing::info_span!("driver.pull_image", node = %self.node, image);
        async {
            tracing::info!("pulling");
            check_image_ref(image)?;

            let start = std::time::Instant::now();
            let result = self.inner.pull_image(image).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(progress) => {
                    tracing::info!(lines = progress.len(), elapsed_ms, "image pulled")
                }
                Err(e) => tracing::error!(elapsed_ms, error = %e, "pull failed"),
            }

            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any ClusterStore
///
/// Every resolved node's driver is wrapped in a [`TracedEngineDriver`].
#[derive(Clone, Debug)]
pub struct TracedClusterStore<C> {
    inner: C,
}

impl<C> TracedClusterStore<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

fn traced_node<D>(handle: NodeHandle<D>) -> NodeHandle<TracedEngineDriver<D>> {
    let node = format!("{}/{}", handle.pod, handle.name);
    handle.map_driver(|driver| TracedEngineDriver::new(node, driver))
}

#[async_trait]
impl<C: ClusterStore> ClusterStore for TracedClusterStore<C> {
    type Driver = TracedEngineDriver<C::Driver>;

    async fn get_node(
        &self,
        pod: &str,
        node: &str,
    ) -> Result<NodeHandle<Self::Driver>, ClusterError> {
        let result = self.inner.get_node(pod, node).await;
        match &result {
            Ok(_) => tracing::debug!(pod, node, "node resolved"),
            Err(e) => tracing::warn!(pod, node, error = %e, "node lookup failed"),
        }
        result.map(traced_node)
    }

    async fn get_nodes(&self, pod: &str) -> Result<Vec<NodeHandle<Self::Driver>>, ClusterError> {
        let result = self.inner.get_nodes(pod).await;
        match &result {
            Ok(nodes) => tracing::debug!(pod, nodes = nodes.len(), "pod resolved"),
            Err(e) => tracing::warn!(pod, error = %e, "pod lookup failed"),
        }
        result.map(|nodes| nodes.into_iter().map(traced_node).collect())
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;

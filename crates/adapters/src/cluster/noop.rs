// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op cluster store for deployments without an inventory.

use super::{ClusterError, ClusterStore, NodeHandle};
use crate::driver::NoOpEngineDriver;
use async_trait::async_trait;

/// Cluster store with no pods.
///
/// Every node lookup fails, so recovery of node-bound entries reports them
/// instead of dropping them.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpClusterStore;

impl NoOpClusterStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ClusterStore for NoOpClusterStore {
    type Driver = NoOpEngineDriver;

    async fn get_node(
        &self,
        pod: &str,
        node: &str,
    ) -> Result<NodeHandle<Self::Driver>, ClusterError> {
        Err(ClusterError::NodeNotFound {
            pod: pod.to_string(),
            node: node.to_string(),
        })
    }

    async fn get_nodes(&self, pod: &str) -> Result<Vec<NodeHandle<Self::Driver>>, ClusterError> {
        Err(ClusterError::PodNotFound(pod.to_string()))
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster inventory: resolving pods and nodes to engine drivers

mod noop;

pub use noop::NoOpClusterStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ClusterCall, FakeClusterStore};

use crate::driver::EngineDriver;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from cluster store lookups
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("pod not found: {0}")]
    PodNotFound(String),
    #[error("node not found: {pod}/{node}")]
    NodeNotFound { pod: String, node: String },
    #[error("cluster store unavailable: {0}")]
    Unavailable(String),
}

/// A resolved node and the driver for its container engine
#[derive(Debug, Clone)]
pub struct NodeHandle<D> {
    pub pod: String,
    pub name: String,
    pub driver: D,
}

impl<D> NodeHandle<D> {
    pub fn new(pod: impl Into<String>, name: impl Into<String>, driver: D) -> Self {
        Self {
            pod: pod.into(),
            name: name.into(),
            driver,
        }
    }

    /// Replace the driver, keeping the node's identity
    pub fn map_driver<E>(self, f: impl FnOnce(D) -> E) -> NodeHandle<E> {
        NodeHandle {
            pod: self.pod,
            name: self.name,
            driver: f(self.driver),
        }
    }
}

/// Source of node handles
#[async_trait]
pub trait ClusterStore: Clone + Send + Sync + 'static {
    type Driver: EngineDriver;

    /// Resolve one node of a pod
    async fn get_node(&self, pod: &str, node: &str)
        -> Result<NodeHandle<Self::Driver>, ClusterError>;

    /// Every node of a pod, ordered by name
    async fn get_nodes(&self, pod: &str) -> Result<Vec<NodeHandle<Self::Driver>>, ClusterError>;
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake cluster store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ClusterError, ClusterStore, NodeHandle};
use crate::driver::FakeEngineDriver;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Recorded cluster store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCall {
    GetNode { pod: String, node: String },
    GetNodes { pod: String },
}

/// In-memory pods of nodes, each with a [`FakeEngineDriver`]
#[derive(Clone, Default)]
pub struct FakeClusterStore {
    pods: Arc<Mutex<BTreeMap<String, BTreeMap<String, FakeEngineDriver>>>>,
    unavailable: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<Vec<ClusterCall>>>,
}

impl FakeClusterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its driver
    pub fn add_node(&self, pod: &str, node: &str) -> FakeEngineDriver {
        self.pods
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(pod.to_string())
            .or_default()
            .entry(node.to_string())
            .or_default()
            .clone()
    }

    /// Driver of an existing node
    pub fn driver(&self, pod: &str, node: &str) -> Option<FakeEngineDriver> {
        self.pods
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(pod)
            .and_then(|nodes| nodes.get(node))
            .cloned()
    }

    /// Fail every lookup with `reason`, or clear with `None`
    pub fn set_unavailable(&self, reason: Option<&str>) {
        *self.unavailable.lock().unwrap_or_else(|e| e.into_inner()) = reason.map(String::from);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ClusterCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn check_available(&self) -> Result<(), ClusterError> {
        match self
            .unavailable
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            Some(reason) => Err(ClusterError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ClusterStore for FakeClusterStore {
    type Driver = FakeEngineDriver;

    async fn get_node(
        &self,
        pod: &str,
        node: &str,
    ) -> Result<NodeHandle<Self::Driver>, ClusterError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ClusterCall::GetNode {
                pod: pod.to_string(),
                node: node.to_string(),
            });
        self.check_available()?;

        self.driver(pod, node)
            .map(|driver| NodeHandle::new(pod, node, driver))
            .ok_or_else(|| ClusterError::NodeNotFound {
                pod: pod.to_string(),
                node: node.to_string(),
            })
    }

    async fn get_nodes(&self, pod: &str) -> Result<Vec<NodeHandle<Self::Driver>>, ClusterError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ClusterCall::GetNodes {
                pod: pod.to_string(),
            });
        self.check_available()?;

        let pods = self.pods.lock().unwrap_or_else(|e| e.into_inner());
        let nodes = pods
            .get(pod)
            .ok_or_else(|| ClusterError::PodNotFound(pod.to_string()))?;
        Ok(nodes
            .iter()
            .map(|(name, driver)| NodeHandle::new(pod, name.as_str(), driver.clone()))
            .collect())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine operations

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fanout::{self, FanOutLimits, ResultStream};
use crate::image::{
    pull_one, remove_one, replay_remove_image, RemoveImageEvent, REMOVE_IMAGE_EVENT,
};
use crate::locks::HeldLocks;
use corral_adapters::{ClusterStore, NodeHandle};
use corral_core::{node_key, Context, LockProvider, Observer};
use corral_storage::{hook_fn, Commit, RecoveryReport, Wal};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::Instrument;

/// Engine collaborators
pub struct EngineDeps<C, L> {
    pub cluster: C,
    pub locks: L,
    pub wal: Arc<Wal>,
    pub observer: Observer,
}

/// Runs lock-guarded, optionally WAL-guarded fan-out operations
pub struct Engine<C, L> {
    cluster: C,
    locks: Arc<L>,
    wal: Arc<Wal>,
    observer: Observer,
    config: EngineConfig,
}

impl<C, L> Engine<C, L>
where
    C: ClusterStore,
    L: LockProvider,
{
    /// Build the engine and register its recovery hooks with the WAL
    pub fn new(deps: EngineDeps<C, L>, config: EngineConfig) -> Self {
        let engine = Self {
            cluster: deps.cluster,
            locks: Arc::new(deps.locks),
            wal: deps.wal,
            observer: deps.observer,
            config,
        };
        engine.register_hooks();
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn wal(&self) -> &Arc<Wal> {
        &self.wal
    }

    fn limits(&self) -> FanOutLimits {
        FanOutLimits {
            max_concurrency: self.config.max_concurrency,
            buffer: self.config.result_buffer,
        }
    }

    async fn lock_nodes(
        &self,
        ctx: &Context,
        nodes: &[NodeHandle<C::Driver>],
    ) -> Result<HeldLocks, EngineError> {
        let keys: BTreeSet<String> = nodes.iter().map(|n| node_key(&n.pod, &n.name)).collect();
        let locks = HeldLocks::acquire(self.locks.as_ref(), ctx, keys, self.config.lock_timeout)
            .await
            .map_err(|e| EngineError::Lock(self.observer.err("acquire node locks", e)))?;
        tracing::debug!(keys = ?locks.keys(), "locks held");
        Ok(locks)
    }

    /// Remove images from one node
    ///
    /// Durable: the removal is logged before any image is touched and the
    /// entry is committed once every image has reported. Returns one result
    /// per image.
    pub async fn remove_image(
        &self,
        ctx: &Context,
        pod: &str,
        node: &str,
        images: Vec<String>,
    ) -> Result<ResultStream, EngineError> {
        let span = tracing::info_span!("engine.remove_image", pod, node, images = images.len());
        self.start_remove_image(ctx, pod, node, images)
            .instrument(span)
            .await
    }

    async fn start_remove_image(
        &self,
        ctx: &Context,
        pod: &str,
        node: &str,
        images: Vec<String>,
    ) -> Result<ResultStream, EngineError> {
        tracing::info!("starting");
        let handle = self.cluster.get_node(pod, node).await?;
        if images.is_empty() {
            tracing::info!("no images to remove");
            return Ok(ResultStream::closed());
        }

        let locks = self.lock_nodes(ctx, std::slice::from_ref(&handle)).await?;

        let event = RemoveImageEvent {
            pod: pod.to_string(),
            node: node.to_string(),
            images,
        };
        let commit = match self.wal.log(REMOVE_IMAGE_EVENT, &event) {
            Ok(commit) => commit,
            Err(e) => {
                locks.release().await;
                return Err(e.into());
            }
        };

        let units = event.images.into_iter().map(|i| (i.clone(), i)).collect();
        let driver = handle.driver;
        let worker_ctx = ctx.child();
        let timeout = self.config.driver_timeout;

        Ok(fanout::run(
            units,
            self.limits(),
            move |reference| remove_one(driver.clone(), reference, worker_ctx.clone(), timeout),
            settle(Some(commit), locks),
        ))
    }

    /// Pull an image onto nodes of a pod
    ///
    /// An empty `nodes` list means every node in the pod. Not logged: an
    /// interrupted pull is simply repeated by the caller. Returns one result
    /// per node.
    pub async fn cache_image(
        &self,
        ctx: &Context,
        pod: &str,
        nodes: Vec<String>,
        image: &str,
    ) -> Result<ResultStream, EngineError> {
        let span = tracing::info_span!("engine.cache_image", pod, image, nodes = nodes.len());
        self.start_cache_image(ctx, pod, nodes, image)
            .instrument(span)
            .await
    }

    async fn start_cache_image(
        &self,
        ctx: &Context,
        pod: &str,
        nodes: Vec<String>,
        image: &str,
    ) -> Result<ResultStream, EngineError> {
        tracing::info!("starting");
        let handles = if nodes.is_empty() {
            self.cluster.get_nodes(pod).await?
        } else {
            let names: BTreeSet<String> = nodes.into_iter().collect();
            let mut handles = Vec::with_capacity(names.len());
            for name in &names {
                handles.push(self.cluster.get_node(pod, name).await?);
            }
            handles
        };
        if handles.is_empty() {
            tracing::info!("no nodes to cache on");
            return Ok(ResultStream::closed());
        }

        let locks = self.lock_nodes(ctx, &handles).await?;

        let units = handles.into_iter().map(|h| (h.name.clone(), h)).collect();
        let reference = image.to_string();
        let worker_ctx = ctx.child();
        let timeout = self.config.driver_timeout;

        Ok(fanout::run(
            units,
            self.limits(),
            move |handle: NodeHandle<C::Driver>| {
                pull_one(
                    handle.driver,
                    handle.name,
                    reference.clone(),
                    worker_ctx.clone(),
                    timeout,
                )
            },
            settle(None, locks),
        ))
    }

    /// Replay uncommitted entries through the engine's hooks
    pub async fn recover(&self, ctx: &Context) -> Result<RecoveryReport, EngineError> {
        Ok(self.wal.recover(ctx).await?)
    }

    fn register_hooks(&self) {
        let cluster = self.cluster.clone();
        let timeout = self.config.driver_timeout;
        self.wal.register_recover_hook(
            REMOVE_IMAGE_EVENT,
            hook_fn(move |event: RemoveImageEvent| {
                replay_remove_image(cluster.clone(), event, timeout)
            }),
        );
    }
}

/// Commit the operation's entry, then release its locks
async fn settle(commit: Option<Commit>, locks: HeldLocks) {
    if let Some(commit) = commit {
        // A failed commit was already reported; the entry is replayed on restart
        if commit.commit().is_err() {
            tracing::warn!(key = commit.key(), "entry left for recovery");
        }
    }
    locks.release().await;
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

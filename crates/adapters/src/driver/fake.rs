// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake engine driver for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{DriverError, EngineDriver, ImageDeleteItem, RemoveImageOptions};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Recorded driver call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    RemoveImage {
        image: String,
        opts: RemoveImageOptions,
    },
    PullImage {
        image: String,
    },
}

/// In-memory image store with failure injection
#[derive(Clone)]
pub struct FakeEngineDriver {
    /// reference → image id
    images: Arc<Mutex<BTreeMap<String, String>>>,
    failures: Arc<Mutex<HashMap<String, String>>>,
    panics: Arc<Mutex<HashSet<String>>>,
    delay: Arc<Mutex<Option<Duration>>>,
    /// `true` while calls are held back
    paused: Arc<watch::Sender<bool>>,
    next_id: Arc<AtomicU64>,
    calls: Arc<Mutex<Vec<DriverCall>>>,
}

impl Default for FakeEngineDriver {
    fn default() -> Self {
        Self {
            images: Arc::default(),
            failures: Arc::default(),
            panics: Arc::default(),
            delay: Arc::default(),
            paused: Arc::new(watch::Sender::new(false)),
            next_id: Arc::new(AtomicU64::new(1)),
            calls: Arc::default(),
        }
    }
}

impl FakeEngineDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an image and return its id
    pub fn add_image(&self, reference: &str) -> String {
        let id = format!("sha256:{:064x}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.images
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(reference.to_string(), id.clone());
        id
    }

    pub fn has_image(&self, reference: &str) -> bool {
        self.images
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(reference)
    }

    /// Present image references, sorted
    pub fn images(&self) -> Vec<String> {
        self.images
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// Make every call for `image` fail with `message`
    pub fn fail_on(&self, image: &str, message: &str) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(image.to_string(), message.to_string());
    }

    /// Make every call for `image` panic
    pub fn panic_on(&self, image: &str) {
        self.panics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(image.to_string());
    }

    /// Sleep this long before answering each call
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
    }

    /// Hold every call until [`resume`](Self::resume)
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: DriverCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    /// Apply pause, delay and injected faults for one call
    #[allow(clippy::panic)]
    async fn intercept(&self, image: &str) -> Result<(), DriverError> {
        let mut paused = self.paused.subscribe();
        // The sender lives in self, so the channel cannot close here
        let _ = paused.wait_for(|held| !*held).await;

        let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self
            .panics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(image)
        {
            panic!("injected driver panic for {}", image);
        }

        let failure = self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(image)
            .cloned();
        match failure {
            Some(message) => Err(DriverError::RequestFailed(message)),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for FakeEngineDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeEngineDriver")
            .field("images", &self.images())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EngineDriver for FakeEngineDriver {
    async fn remove_image(
        &self,
        image: &str,
        opts: RemoveImageOptions,
    ) -> Result<Vec<ImageDeleteItem>, DriverError> {
        self.record(DriverCall::RemoveImage {
            image: image.to_string(),
            opts,
        });
        self.intercept(image).await?;

        let mut images = self.images.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(id) = images.remove(image) {
            return Ok(vec![
                ImageDeleteItem::Untagged(image.to_string()),
                ImageDeleteItem::Deleted(id),
            ]);
        }

        // Removal by id drops every reference to it
        let tagged: Vec<String> = images
            .iter()
            .filter(|(_, id)| id.as_str() == image)
            .map(|(reference, _)| reference.clone())
            .collect();
        if tagged.is_empty() {
            return Err(DriverError::NoSuchImage(image.to_string()));
        }

        let mut items = Vec::new();
        for reference in tagged {
            images.remove(&reference);
            items.push(ImageDeleteItem::Untagged(reference));
        }
        items.push(ImageDeleteItem::Deleted(image.to_string()));
        Ok(items)
    }

    async fn pull_image(&self, image: &str) -> Result<Vec<String>, DriverError> {
        self.record(DriverCall::PullImage {
            image: image.to_string(),
        });
        self.intercept(image).await?;

        if self.has_image(image) {
            return Ok(vec![format!("Status: Image is up to date for {}", image)]);
        }

        let id = self.add_image(image);
        Ok(vec![
            format!("Pulling from {}", image),
            format!("Digest: {}", id),
            format!("Status: Downloaded newer image for {}", image),
        ])
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;

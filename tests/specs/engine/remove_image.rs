//! Removing images streams one result per image and commits its entry.

use crate::prelude::*;
use corral_adapters::FakeClusterStore;
use corral_core::{Context, LocalLockProvider, Observer};
use corral_engine::{Engine, EngineConfig, EngineDeps};
use std::sync::Arc;

fn engine(store: &StoreDir, cluster: &FakeClusterStore) -> Engine<FakeClusterStore, LocalLockProvider> {
    Engine::new(
        EngineDeps {
            cluster: cluster.clone(),
            locks: LocalLockProvider::new(),
            wal: Arc::new(store.open_wal()),
            observer: Observer::noop(),
        },
        EngineConfig::default(),
    )
}

#[tokio::test]
async fn one_failing_image_does_not_fail_the_operation() {
    let store = StoreDir::new();
    let cluster = FakeClusterStore::new();
    let driver = cluster.add_node("pod", "node1");
    driver.add_image("img1");
    driver.add_image("img2");
    driver.fail_on("img2", "image is in use");
    let engine = engine(&store, &cluster);

    let stream = engine
        .remove_image(&Context::background(), "pod", "node1", strings(&["img1", "img2"]))
        .await
        .unwrap();
    let mut results = stream.collect().await;
    results.sort_by(|a, b| a.target.cmp(&b.target));

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].target, "img1");
    assert!(results[0].success);
    assert_eq!(results[1].target, "img2");
    assert!(!results[1].success);
    assert!(results[1].messages.join(" ").contains("image is in use"));

    // Settled: the entry is committed and the node lock is free
    assert!(engine.wal().pending().await.unwrap().is_empty());
    let again = engine
        .remove_image(&Context::background(), "pod", "node1", strings(&["img1"]))
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(again.len(), 1);
}

#[tokio::test]
async fn unknown_node_fails_synchronously() {
    let store = StoreDir::new();
    let cluster = FakeClusterStore::new();
    let engine = engine(&store, &cluster);

    let result = engine
        .remove_image(&Context::background(), "pod", "missing", strings(&["img1"]))
        .await;

    assert!(result.is_err());
    assert!(engine.wal().pending().await.unwrap().is_empty());
}

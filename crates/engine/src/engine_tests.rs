// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use corral_adapters::{FakeClusterStore, FakeEngineDriver, FakeErrorReporter};
use corral_core::{LocalLockProvider, LockError, OperationResult};
use corral_storage::{LogEntry, WalError};
use std::time::Duration;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    cluster: FakeClusterStore,
    reporter: FakeErrorReporter,
    engine: Engine<FakeClusterStore, LocalLockProvider>,
}

impl Harness {
    async fn pending(&self) -> Vec<LogEntry> {
        self.engine.wal().pending().await.unwrap()
    }
}

fn harness_with(config: EngineConfig) -> Harness {
    let dir = TempDir::new().unwrap();
    let reporter = FakeErrorReporter::new();
    let observer = Observer::new(Arc::new(reporter.clone()));
    let wal = Wal::open(
        &dir.path().join("wal.db"),
        0o600,
        Duration::from_secs(1),
        observer.clone(),
    )
    .unwrap();
    let cluster = FakeClusterStore::new();

    let engine = Engine::new(
        EngineDeps {
            cluster: cluster.clone(),
            locks: LocalLockProvider::new(),
            wal: Arc::new(wal),
            observer,
        },
        config,
    );

    Harness {
        _dir: dir,
        cluster,
        reporter,
        engine,
    }
}

fn harness() -> Harness {
    harness_with(EngineConfig::default())
}

fn node_with_images(h: &Harness, node: &str, images: &[&str]) -> FakeEngineDriver {
    let driver = h.cluster.add_node("pod", node);
    for image in images {
        driver.add_image(image);
    }
    driver
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn by_target(mut results: Vec<OperationResult>) -> Vec<OperationResult> {
    results.sort_by(|a, b| a.target.cmp(&b.target));
    results
}

// =============================================================================
// remove_image
// =============================================================================

#[tokio::test]
async fn remove_image_reports_each_image_and_per_unit_failures() {
    let h = harness();
    let driver = node_with_images(&h, "n1", &["img1", "img2"]);
    driver.fail_on("img2", "image is being used by running container");
    let ctx = Context::background();

    let stream = h
        .engine
        .remove_image(&ctx, "pod", "n1", strings(&["img1", "img2"]))
        .await
        .unwrap();
    let results = by_target(stream.collect().await);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].target, "img1");
    assert!(results[0].success);
    assert_eq!(results[0].messages[0], "Untagged: img1");
    assert!(results[0].messages[1].starts_with("Deleted: sha256:"));
    assert_eq!(results[1].target, "img2");
    assert!(!results[1].success);
    assert!(results[1].messages[0].contains("being used by running container"));
    assert!(h.pending().await.is_empty());
}

#[tokio::test]
async fn remove_image_uses_non_forcing_pruning_removal() {
    let h = harness();
    let driver = node_with_images(&h, "n1", &["img1"]);

    let stream = h
        .engine
        .remove_image(&Context::background(), "pod", "n1", strings(&["img1"]))
        .await
        .unwrap();
    stream.collect().await;

    assert_eq!(
        driver.calls(),
        vec![corral_adapters::DriverCall::RemoveImage {
            image: "img1".to_string(),
            opts: corral_adapters::RemoveImageOptions {
                force: false,
                prune_children: true,
            },
        }]
    );
}

#[tokio::test]
async fn remove_image_on_unknown_node_fails_before_logging() {
    let h = harness();

    let result = h
        .engine
        .remove_image(&Context::background(), "pod", "ghost", strings(&["img1"]))
        .await;

    assert!(matches!(result, Err(EngineError::NotFound(_))));
    assert!(h.pending().await.is_empty());
}

#[tokio::test]
async fn remove_image_with_unavailable_cluster_is_cluster_error() {
    let h = harness();
    node_with_images(&h, "n1", &["img1"]);
    h.cluster.set_unavailable(Some("inventory offline"));

    let result = h
        .engine
        .remove_image(&Context::background(), "pod", "n1", strings(&["img1"]))
        .await;

    assert!(matches!(result, Err(EngineError::Cluster(_))));
}

#[tokio::test]
async fn remove_image_with_no_images_closes_immediately() {
    let h = harness();
    let driver = node_with_images(&h, "n1", &[]);

    let mut stream = h
        .engine
        .remove_image(&Context::background(), "pod", "n1", vec![])
        .await
        .unwrap();

    assert!(stream.next().await.is_none());
    assert!(driver.calls().is_empty());
    assert!(h.pending().await.is_empty());
}

#[tokio::test]
async fn wal_entry_lives_exactly_as_long_as_the_operation() {
    let h = harness();
    let driver = node_with_images(&h, "n1", &["img1"]);
    driver.pause();

    let stream = h
        .engine
        .remove_image(&Context::background(), "pod", "n1", strings(&["img1"]))
        .await
        .unwrap();

    let pending = h.pending().await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].event_type, REMOVE_IMAGE_EVENT);
    assert_eq!(
        pending[0].decode::<RemoveImageEvent>().unwrap(),
        RemoveImageEvent {
            pod: "pod".to_string(),
            node: "n1".to_string(),
            images: strings(&["img1"]),
        }
    );

    driver.resume();
    stream.collect().await;
    assert!(h.pending().await.is_empty());
}

#[tokio::test]
async fn operations_on_one_node_are_serialized() {
    let h = harness_with(EngineConfig {
        lock_timeout: Duration::from_millis(100),
        ..EngineConfig::default()
    });
    let driver = node_with_images(&h, "n1", &["img1", "img2"]);
    driver.pause();
    let ctx = Context::background();

    let first = h
        .engine
        .remove_image(&ctx, "pod", "n1", strings(&["img1"]))
        .await
        .unwrap();

    let blocked = h
        .engine
        .remove_image(&ctx, "pod", "n1", strings(&["img2"]))
        .await;
    assert!(matches!(
        blocked,
        Err(EngineError::Lock(LockError::Timeout { ref key })) if key == "node/pod/n1"
    ));
    assert!(h
        .reporter
        .messages()
        .iter()
        .any(|m| m.contains("acquire node locks")));

    driver.resume();
    first.collect().await;

    let second = h
        .engine
        .remove_image(&ctx, "pod", "n1", strings(&["img2"]))
        .await
        .unwrap();
    assert!(second.collect().await[0].success);
}

#[tokio::test]
async fn operations_on_different_nodes_run_concurrently() {
    let h = harness_with(EngineConfig {
        lock_timeout: Duration::from_millis(100),
        ..EngineConfig::default()
    });
    let d1 = node_with_images(&h, "n1", &["img"]);
    node_with_images(&h, "n2", &["img"]);
    d1.pause();
    let ctx = Context::background();

    let first = h
        .engine
        .remove_image(&ctx, "pod", "n1", strings(&["img"]))
        .await
        .unwrap();
    let second = h
        .engine
        .remove_image(&ctx, "pod", "n2", strings(&["img"]))
        .await
        .unwrap();

    assert!(second.collect().await[0].success);
    d1.resume();
    assert!(first.collect().await[0].success);
}

#[tokio::test]
async fn panicking_driver_yields_failed_result_and_releases_lock() {
    let h = harness();
    let driver = node_with_images(&h, "n1", &["img1", "img2"]);
    driver.panic_on("img2");
    let ctx = Context::background();

    let results = by_target(
        h.engine
            .remove_image(&ctx, "pod", "n1", strings(&["img1", "img2"]))
            .await
            .unwrap()
            .collect()
            .await,
    );

    assert_eq!(results.len(), 2);
    assert!(results[0].success);
    assert!(!results[1].success);
    assert!(results[1].messages[0].contains("worker panicked"));
    assert!(h.pending().await.is_empty());

    // Lock was released despite the panic
    let again = h
        .engine
        .remove_image(&ctx, "pod", "n1", strings(&["img1"]))
        .await
        .unwrap();
    assert_eq!(again.collect().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_driver_is_bounded_by_driver_timeout() {
    let h = harness_with(EngineConfig {
        driver_timeout: Duration::from_secs(2),
        ..EngineConfig::default()
    });
    let driver = node_with_images(&h, "n1", &["img1"]);
    driver.set_delay(Duration::from_secs(600));

    let results = h
        .engine
        .remove_image(&Context::background(), "pod", "n1", strings(&["img1"]))
        .await
        .unwrap()
        .collect()
        .await;

    assert!(!results[0].success);
    assert!(results[0].messages[0].contains("deadline exceeded"));
}

#[tokio::test]
async fn dropped_stream_still_commits_and_releases() {
    let h = harness();
    node_with_images(&h, "n1", &["img1", "img2", "img3"]);
    let ctx = Context::background();

    let stream = h
        .engine
        .remove_image(&ctx, "pod", "n1", strings(&["img1", "img2", "img3"]))
        .await
        .unwrap();
    drop(stream);

    // The next operation on the node waits for the first to settle
    let next = h
        .engine
        .remove_image(&ctx, "pod", "n1", strings(&["img1"]))
        .await
        .unwrap();
    let results = next.collect().await;

    assert!(!results[0].success, "img1 was removed by the first operation");
    assert!(h.pending().await.is_empty());
}

#[tokio::test]
async fn max_concurrency_one_runs_images_sequentially() {
    let h = harness_with(EngineConfig {
        max_concurrency: 1,
        result_buffer: 1,
        ..EngineConfig::default()
    });
    let images = ["a", "b", "c", "d"];
    let driver = node_with_images(&h, "n1", &images);

    let results = h
        .engine
        .remove_image(&Context::background(), "pod", "n1", strings(&images))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.success));
    assert!(driver.images().is_empty());
}

// =============================================================================
// cache_image
// =============================================================================

#[tokio::test]
async fn cache_image_on_every_node_when_none_listed() {
    let h = harness();
    let d1 = node_with_images(&h, "n1", &[]);
    let d2 = node_with_images(&h, "n2", &[]);

    let results = by_target(
        h.engine
            .cache_image(&Context::background(), "pod", vec![], "redis:7")
            .await
            .unwrap()
            .collect()
            .await,
    );

    let targets: Vec<&str> = results.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(targets, vec!["n1", "n2"]);
    assert!(results.iter().all(|r| r.success));
    assert!(d1.has_image("redis:7"));
    assert!(d2.has_image("redis:7"));
}

#[tokio::test]
async fn cache_image_on_listed_nodes_only() {
    let h = harness();
    let d1 = node_with_images(&h, "n1", &[]);
    let d2 = node_with_images(&h, "n2", &[]);

    let results = h
        .engine
        .cache_image(
            &Context::background(),
            "pod",
            strings(&["n2", "n2"]),
            "redis:7",
        )
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(results.len(), 1);
    assert!(!d1.has_image("redis:7"));
    assert!(d2.has_image("redis:7"));
}

#[tokio::test]
async fn cache_image_is_not_logged() {
    let h = harness();
    let driver = node_with_images(&h, "n1", &[]);
    driver.pause();

    let stream = h
        .engine
        .cache_image(&Context::background(), "pod", vec![], "redis:7")
        .await
        .unwrap();
    assert!(h.pending().await.is_empty());

    driver.resume();
    stream.collect().await;
}

#[tokio::test]
async fn cache_image_unknown_pod_is_not_found() {
    let h = harness();

    let result = h
        .engine
        .cache_image(&Context::background(), "nope", vec![], "redis:7")
        .await;

    assert!(matches!(result, Err(EngineError::NotFound(_))));
}

#[tokio::test]
async fn cache_image_reports_pull_failures_per_node() {
    let h = harness();
    node_with_images(&h, "n1", &[]);
    let d2 = node_with_images(&h, "n2", &[]);
    d2.fail_on("redis:7", "registry unreachable");

    let results = by_target(
        h.engine
            .cache_image(&Context::background(), "pod", vec![], "redis:7")
            .await
            .unwrap()
            .collect()
            .await,
    );

    assert!(results[0].success);
    assert!(!results[1].success);
    assert!(results[1].messages[0].contains("registry unreachable"));
}

// =============================================================================
// recover
// =============================================================================

#[tokio::test]
async fn recover_replays_interrupted_removal() {
    let h = harness();
    let driver = node_with_images(&h, "n1", &["img1"]);
    let interrupted = RemoveImageEvent {
        pod: "pod".to_string(),
        node: "n1".to_string(),
        images: strings(&["img1", "already-gone"]),
    };
    drop(h.engine.wal().log(REMOVE_IMAGE_EVENT, &interrupted).unwrap());

    let report = h.engine.recover(&Context::background()).await.unwrap();

    assert_eq!(report.recovered, 1);
    assert!(!driver.has_image("img1"));
    assert!(h.pending().await.is_empty());
}

#[tokio::test]
async fn recover_keeps_entry_when_node_is_unknown() {
    let h = harness();
    let orphan = RemoveImageEvent {
        pod: "pod".to_string(),
        node: "decommissioned".to_string(),
        images: strings(&["img1"]),
    };
    drop(h.engine.wal().log(REMOVE_IMAGE_EVENT, &orphan).unwrap());

    let result = h.engine.recover(&Context::background()).await;

    assert!(matches!(
        result,
        Err(EngineError::Wal(WalError::Recovery { recovered: 0, .. }))
    ));
    assert_eq!(h.pending().await.len(), 1);
    assert!(!h.reporter.messages().is_empty());
}

#[tokio::test]
async fn hooks_are_registered_at_construction_and_survive_repeated_recovery() {
    let h = harness();
    assert!(h.engine.wal().has_hook(REMOVE_IMAGE_EVENT));
    let driver = node_with_images(&h, "n1", &["img1", "img2"]);

    for image in ["img1", "img2"] {
        let event = RemoveImageEvent {
            pod: "pod".to_string(),
            node: "n1".to_string(),
            images: strings(&[image]),
        };
        drop(h.engine.wal().log(REMOVE_IMAGE_EVENT, &event).unwrap());

        let report = h.engine.recover(&Context::background()).await.unwrap();

        assert_eq!(report.recovered, 1);
        assert!(!driver.has_image(image));
    }
    assert!(h.pending().await.is_empty());
}

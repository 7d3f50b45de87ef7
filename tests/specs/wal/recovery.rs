//! Uncommitted entries survive a restart and are replayed exactly once.

use crate::prelude::*;
use corral_core::Context;
use corral_storage::{hook_fn, HookError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn uncommitted_entry_is_replayed_after_restart() {
    let store = StoreDir::new();
    {
        let wal = store.open_wal();
        let commit = wal.log("remove-image", &json!({ "node": "n1" })).unwrap();
        // Crash before the commit
        drop(commit);
        wal.close().unwrap();
    }

    let wal = store.open_wal();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    wal.register_recover_hook(
        "remove-image",
        hook_fn(move |event: Value| {
            recorder.lock().unwrap().push(event);
            async { Ok::<(), HookError>(()) }
        }),
    );

    let report = wal.recover(&Context::background()).await.unwrap();

    assert_eq!(report.recovered, 1);
    assert_eq!(*seen.lock().unwrap(), vec![json!({ "node": "n1" })]);
    assert!(wal.pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn committed_entry_is_not_replayed() {
    let store = StoreDir::new();
    {
        let wal = store.open_wal();
        let commit = wal.log("remove-image", &json!({ "node": "n1" })).unwrap();
        assert!(commit.commit().unwrap());
        wal.close().unwrap();
    }

    let wal = store.open_wal();
    wal.register_recover_hook(
        "remove-image",
        hook_fn(|_: Value| async { Err::<(), HookError>("must not run".into()) }),
    );

    let report = wal.recover(&Context::background()).await.unwrap();

    assert_eq!(report.recovered, 0);
}

#[tokio::test]
async fn store_file_is_exclusive_to_one_process() {
    let store = StoreDir::new();
    let _held = store.open_wal();

    let second = corral_storage::Wal::open(
        &store.path,
        0o600,
        std::time::Duration::from_millis(100),
        corral_core::Observer::noop(),
    );

    assert!(second.is_err());
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn static_str_panic_message() {
    let err = tokio::spawn(async { panic!("boom") }).await.unwrap_err();
    assert_eq!(join_failure(err), "panicked: boom");
}

#[tokio::test]
async fn formatted_panic_message() {
    let node = "n1";
    let err = tokio::spawn(async move { panic!("lost {}", node) })
        .await
        .unwrap_err();
    assert_eq!(join_failure(err), "panicked: lost n1");
}

#[tokio::test]
async fn aborted_task_is_cancelled() {
    let task = tokio::spawn(std::future::pending::<()>());
    task.abort();
    let err = task.await.unwrap_err();
    assert_eq!(join_failure(err), "cancelled");
}

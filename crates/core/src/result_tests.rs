// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    succeeded = { OperationResult::succeeded("img1", vec!["Deleted: sha256:abc".into()]), true, 1 },
    succeeded_quietly = { OperationResult::succeeded("img1", Vec::new()), true, 0 },
    failed = { OperationResult::failed("img2", "no such image"), false, 1 },
)]
fn constructors_set_outcome(result: OperationResult, success: bool, message_count: usize) {
    assert_eq!(result.success, success);
    assert_eq!(result.messages.len(), message_count);
}

#[test]
fn result_serializes_for_clients() {
    let result = OperationResult::failed("n1", "pull failed");
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(
        json,
        serde_json::json!({"target": "n1", "success": false, "messages": ["pull failed"]})
    );
}

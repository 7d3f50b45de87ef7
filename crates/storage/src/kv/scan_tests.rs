// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

fn entries(n: usize) -> Vec<ScanEntry> {
    (0..n)
        .map(|i| ScanEntry {
            key: format!("k{:03}", i).into_bytes(),
            value: vec![i as u8],
        })
        .collect()
}

#[tokio::test]
async fn scan_streams_every_entry_then_closes() {
    let mut scan = Scan::spawn(Ok(entries(3)));

    let mut seen = Vec::new();
    while let Some(entry) = scan.next().await {
        seen.push(entry.unwrap().key);
    }

    assert_eq!(seen, vec![b"k000".to_vec(), b"k001".to_vec(), b"k002".to_vec()]);
}

#[tokio::test]
async fn cancel_stops_a_partially_consumed_scan() {
    let mut scan = Scan::spawn(Ok(entries(100)));
    assert!(scan.next().await.is_some());

    scan.cancel();

    // The producer exits instead of blocking on the next send
    tokio::time::timeout(Duration::from_secs(5), async {
        while !scan.is_finished() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    let mut remaining = 0;
    while scan.next().await.is_some() {
        remaining += 1;
    }
    assert!(remaining < 99);
}

#[tokio::test]
async fn detached_canceller_closes_stream() {
    let mut scan = Scan::spawn(Ok(entries(10)));
    let cancel = scan.canceller();

    cancel.cancel();

    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        let mut count = 0;
        while scan.next().await.is_some() {
            count += 1;
        }
        count
    })
    .await
    .unwrap();
    assert!(drained <= 1);
}

#[tokio::test]
async fn error_entry_ends_the_stream() {
    let mut scan = Scan::spawn(Err(KvError::Closed));

    assert!(matches!(scan.next().await, Some(Err(KvError::Closed))));
    assert!(scan.next().await.is_none());
}

#[tokio::test]
async fn collect_returns_first_error() {
    let result = Scan::spawn(Err(KvError::Closed)).collect().await;
    assert!(matches!(result, Err(KvError::Closed)));
}

#[test]
fn scan_outside_runtime_reports_error() {
    let scan = Scan::spawn(Ok(entries(1)));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let result = runtime.block_on(scan.collect());

    assert!(matches!(result, Err(KvError::NoRuntime)));
}

#[tokio::test]
async fn dropping_scan_releases_producer() {
    let scan = Scan::spawn(Ok(entries(100)));
    let cancel = scan.canceller();

    drop(scan);

    assert!(cancel.is_cancelled());
}

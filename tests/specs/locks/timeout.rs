//! A contended lock gives up at the caller's deadline.

use corral_core::{Context, LocalLockProvider, LockError, LockProvider};
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn acquire_times_out_while_lock_is_held() {
    let provider = LocalLockProvider::new();
    let holder = provider.lock("node1");
    let held = holder.acquire(&Context::background()).await.unwrap();

    let start = Instant::now();
    let ctx = Context::background().with_timeout(Duration::from_secs(1));
    let result = provider.lock("node1").acquire(&ctx).await;

    assert!(matches!(result, Err(LockError::Timeout { ref key }) if key == "node1"));
    assert!(start.elapsed() <= Duration::from_millis(1100));

    holder.release(&held).await.unwrap();
}

#[tokio::test]
async fn released_lock_can_be_acquired_again() {
    let provider = LocalLockProvider::new();
    let lock = provider.lock("node1");
    let held = lock.acquire(&Context::background()).await.unwrap();
    lock.release(&held).await.unwrap();

    let next = provider.lock("node1");
    let ctx = Context::background().with_timeout(Duration::from_secs(1));
    let again = next.acquire(&ctx).await.unwrap();

    assert!(again.err().is_none());
    next.release(&again).await.unwrap();
}

#[tokio::test]
async fn release_cancels_the_critical_section_context() {
    let provider = LocalLockProvider::new();
    let lock = provider.lock("node1");
    let held = lock.acquire(&Context::background()).await.unwrap();

    lock.release(&held).await.unwrap();

    assert!(held.err().is_some());
}

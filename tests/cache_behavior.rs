//! Behavior-driven tests for the TTL cache
//!
//! These tests verify the cache lifecycle from a caller's point of view:
//! absent, live, stale, recomputed, and how concurrent callers share one
//! computation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use quotecache_core::CacheStore;

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn when_entry_is_live_system_serves_it_without_computing() {
    // Given: A cache holding one value
    let cache: CacheStore<&'static str, u32> = CacheStore::new(Duration::from_secs(60));
    let calls = AtomicUsize::new(0);
    let compute = || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, String>(7) }
    };
    cache.get_or_compute("k", compute).await.expect("first");

    // When: The same key is requested again
    let value = cache.get_or_compute("k", compute).await.expect("second");

    // Then: The stored value is served
    assert_eq!(*value, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.get(&"k").await.as_deref(), Some(&7));
}

#[tokio::test]
async fn when_entry_goes_stale_system_recomputes_and_replaces_it() {
    // Given: A short TTL and a counter that yields a new value per call
    let cache: CacheStore<&'static str, usize> = CacheStore::new(Duration::from_millis(40));
    let calls = AtomicUsize::new(0);
    let compute = || {
        let next = calls.fetch_add(1, Ordering::SeqCst) + 1;
        async move { Ok::<_, String>(next) }
    };

    // When: The entry is read, left to expire, then read again
    let first = cache.get_or_compute("k", compute).await.expect("first");
    tokio::time::sleep(Duration::from_millis(70)).await;
    let stale_peek = cache.get(&"k").await;
    let second = cache.get_or_compute("k", compute).await.expect("second");

    // Then: The stale entry is invisible and the recomputed one replaces it
    assert_eq!(*first, 1);
    assert!(stale_peek.is_none());
    assert_eq!(*second, 2);
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn when_explicit_ttl_is_shorter_than_default_it_governs_the_lookup() {
    let cache: CacheStore<&'static str, u32> = CacheStore::new(Duration::from_secs(60));
    let calls = AtomicUsize::new(0);
    let compute = || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, String>(1) }
    };

    cache
        .get_or_compute_with_ttl("k", Duration::from_millis(20), compute)
        .await
        .expect("first");
    tokio::time::sleep(Duration::from_millis(40)).await;
    cache
        .get_or_compute_with_ttl("k", Duration::from_millis(20), compute)
        .await
        .expect("second");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn when_computation_fails_nothing_is_stored() {
    // Given: An empty cache
    let cache: CacheStore<&'static str, u32> = CacheStore::with_default_ttl();

    // When: The computation fails
    let result = cache
        .get_or_compute("k", || async { Err::<u32, _>("upstream down") })
        .await;

    // Then: The error reaches the caller and the key stays absent
    assert_eq!(result, Err("upstream down"));
    assert!(cache.get(&"k").await.is_none());
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn when_failure_follows_a_stale_entry_the_stale_value_is_not_served() {
    let cache: CacheStore<&'static str, u32> = CacheStore::new(Duration::from_millis(30));
    cache
        .get_or_compute("k", || async { Ok::<_, &str>(1) })
        .await
        .expect("seed");
    tokio::time::sleep(Duration::from_millis(60)).await;

    let result = cache
        .get_or_compute("k", || async { Err::<u32, _>("down") })
        .await;

    assert_eq!(result, Err("down"));
    assert!(cache.get(&"k").await.is_none());
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn when_callers_race_on_one_key_a_single_computation_is_shared() {
    // Given: A cache cloned across tasks and a slow computation
    let cache: CacheStore<String, usize> = CacheStore::with_default_ttl();
    let calls = Arc::new(AtomicUsize::new(0));

    // When: Eight tasks miss the same key at once
    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        let calls = Arc::clone(&calls);
        handles.push(tokio::spawn(async move {
            cache
                .get_or_compute(String::from("005930"), || async move {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    Ok::<_, String>(calls.fetch_add(1, Ordering::SeqCst))
                })
                .await
        }));
    }
    let mut values = Vec::new();
    for handle in handles {
        values.push(handle.await.expect("task").expect("value"));
    }

    // Then: One computation ran and every caller got its result
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(values.iter().all(|value| Arc::ptr_eq(value, &values[0])));
}

#[tokio::test]
async fn when_the_first_caller_fails_a_waiting_caller_computes_afresh() {
    // Given: A failing leader and a succeeding follower on one key
    let cache: CacheStore<&'static str, u32> = CacheStore::with_default_ttl();
    let calls = AtomicUsize::new(0);

    // When: Both race
    let leader = cache.get_or_compute("k", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Err::<u32, _>("leader failed")
        }
    });
    let follower = cache.get_or_compute("k", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, &str>(9) }
    });
    let (leader, follower) = tokio::join!(leader, follower);

    // Then: The failure is not shared; the follower stores its own value
    assert_eq!(leader, Err("leader failed"));
    assert_eq!(follower.as_deref(), Ok(&9));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.get(&"k").await.as_deref(), Some(&9));
}

#[tokio::test]
async fn when_keys_differ_computations_do_not_block_each_other() {
    let cache: CacheStore<&'static str, u32> = CacheStore::with_default_ttl();

    let slow = cache.get_or_compute("slow", || async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok::<_, String>(1)
    });
    let fast = tokio::time::timeout(
        Duration::from_millis(100),
        cache.get_or_compute("fast", || async { Ok::<_, String>(2) }),
    );
    let (slow, fast) = tokio::join!(slow, fast);

    assert_eq!(slow.as_deref(), Ok(&1));
    assert_eq!(fast.expect("fast key must not wait").as_deref(), Ok(&2));
}

// =============================================================================
// Maintenance
// =============================================================================

#[tokio::test]
async fn when_expired_entries_are_cleared_live_entries_survive() {
    let cache: CacheStore<&'static str, u32> = CacheStore::new(Duration::from_millis(40));
    cache
        .get_or_compute("old", || async { Ok::<_, String>(1) })
        .await
        .expect("old");
    tokio::time::sleep(Duration::from_millis(70)).await;
    cache
        .get_or_compute("new", || async { Ok::<_, String>(2) })
        .await
        .expect("new");

    cache.clear_expired();

    assert_eq!(cache.len().await, 1);
    assert!(cache.get(&"new").await.is_some());
}

#[tokio::test]
async fn when_cache_is_disabled_every_lookup_computes() {
    let cache: CacheStore<&'static str, u32> = CacheStore::disabled();
    let calls = AtomicUsize::new(0);
    let compute = || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, String>(3) }
    };

    cache.get_or_compute("k", compute).await.expect("first");
    cache.get_or_compute("k", compute).await.expect("second");

    assert!(cache.is_disabled());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(cache.is_empty().await);
}

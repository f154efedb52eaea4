//! In-memory TTL cache with per-key single-flight computation.
//!
//! Each key owns a slot guarded by an async mutex. The first caller to find a
//! slot empty or stale holds that mutex across the computation, so concurrent
//! misses for the same key wait and then read the fresh value instead of
//! fetching again. Failed computations are never stored: the next caller
//! (including any waiter) computes again, and a slot that never held a value
//! is dropped once nobody waits on it.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Default time-to-live for cached quotes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct CacheEntry<V> {
    value: Arc<V>,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() < ttl
    }
}

#[derive(Debug)]
struct Slot<V> {
    entry: tokio::sync::Mutex<Option<CacheEntry<V>>>,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            entry: tokio::sync::Mutex::new(None),
        }
    }
}

#[derive(Debug)]
struct CacheInner<K, V> {
    slots: Mutex<HashMap<K, Arc<Slot<V>>>>,
    default_ttl: Duration,
}

/// Thread-safe TTL store of computed values, shared by cloning.
///
/// Values are handed out as `Arc<V>`; a refresh replaces the stored `Arc`
/// and never mutates a value a caller already holds.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    inner: Arc<CacheInner<K, V>>,
}

impl<K, V> Clone for CacheStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Create a new cache store with a default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                slots: Mutex::new(HashMap::new()),
                default_ttl,
            }),
        }
    }

    /// Create a cache store with the five-minute default TTL.
    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_TTL)
    }

    /// Create a disabled cache: every lookup computes and nothing is stored.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn default_ttl(&self) -> Duration {
        self.inner.default_ttl
    }

    pub fn is_disabled(&self) -> bool {
        self.inner.default_ttl.is_zero()
    }

    /// Return the live value for `key`, or run `compute` and store its result.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.get_or_compute_with_ttl(key, self.inner.default_ttl, compute)
            .await
    }

    /// Like [`get_or_compute`](Self::get_or_compute) with an explicit TTL.
    ///
    /// A zero TTL bypasses the store entirely.
    pub async fn get_or_compute_with_ttl<F, Fut, E>(
        &self,
        key: K,
        ttl: Duration,
        compute: F,
    ) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if ttl.is_zero() {
            return compute().await.map(Arc::new);
        }

        let slot = self.slot(&key);
        let mut guard = slot.entry.lock().await;

        if let Some(entry) = guard.as_ref() {
            if entry.is_live(ttl) {
                debug!(target: "quotecache::cache", ?key, "cache hit");
                return Ok(Arc::clone(&entry.value));
            }
            debug!(target: "quotecache::cache", ?key, "cache entry stale");
        } else {
            debug!(target: "quotecache::cache", ?key, "cache miss");
        }

        let value = match compute().await {
            Ok(value) => Arc::new(value),
            Err(error) => {
                let vacant = guard.is_none();
                drop(guard);
                if vacant {
                    self.release_vacant(&key, &slot);
                }
                return Err(error);
            }
        };
        *guard = Some(CacheEntry {
            value: Arc::clone(&value),
            inserted_at: Instant::now(),
        });
        Ok(value)
    }

    /// Peek at the live value for `key` without computing.
    ///
    /// Waits if a computation for `key` is in flight.
    pub async fn get(&self, key: &K) -> Option<Arc<V>> {
        let slot = self.existing_slot(key)?;
        let guard = slot.entry.lock().await;
        guard
            .as_ref()
            .filter(|entry| entry.is_live(self.inner.default_ttl))
            .map(|entry| Arc::clone(&entry.value))
    }

    /// Drop entries whose default TTL has elapsed. Slots with a computation in
    /// flight are kept.
    pub fn clear_expired(&self) {
        let ttl = self.inner.default_ttl;
        self.lock_slots()
            .retain(|_, slot| match slot.entry.try_lock() {
                Ok(guard) => guard.as_ref().is_some_and(|entry| entry.is_live(ttl)),
                Err(_) => true,
            });
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.lock_slots().clear();
    }

    /// Number of stored entries, including stale ones.
    pub async fn len(&self) -> usize {
        let slots: Vec<Arc<Slot<V>>> = self.lock_slots().values().cloned().collect();
        let mut count = 0;
        for slot in slots {
            if slot.entry.lock().await.is_some() {
                count += 1;
            }
        }
        count
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn slot(&self, key: &K) -> Arc<Slot<V>> {
        let mut slots = self.lock_slots();
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Forget an empty slot once no other caller holds it, so keys that only
    /// ever failed do not accumulate.
    fn release_vacant(&self, key: &K, slot: &Arc<Slot<V>>) {
        let mut slots = self.lock_slots();
        // The map and `slot` itself account for two references.
        let unshared = slots
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && Arc::strong_count(slot) == 2);
        if unshared {
            slots.remove(key);
        }
    }

    fn existing_slot(&self, key: &K) -> Option<Arc<Slot<V>>> {
        self.lock_slots().get(key).cloned()
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<K, Arc<Slot<V>>>> {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn ok(value: &str) -> Result<String, String> {
        Ok(value.to_string())
    }

    #[tokio::test]
    async fn serves_live_entries_without_recomputing() {
        let cache: CacheStore<String, String> = CacheStore::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_compute("key1".to_string(), || {
                calls.fetch_add(1, Ordering::SeqCst);
                ok("value1")
            })
            .await
            .expect("compute succeeds");
        let second = cache
            .get_or_compute("key1".to_string(), || {
                calls.fetch_add(1, Ordering::SeqCst);
                ok("value2")
            })
            .await
            .expect("cache hit");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.as_str(), "value1");
    }

    #[tokio::test]
    async fn recomputes_after_expiration() {
        let cache: CacheStore<String, String> = CacheStore::new(Duration::from_millis(50));

        cache
            .get_or_compute("key1".to_string(), || ok("value1"))
            .await
            .expect("compute");
        assert!(cache.get(&"key1".to_string()).await.is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.get(&"key1".to_string()).await.is_none());

        let refreshed = cache
            .get_or_compute("key1".to_string(), || ok("value2"))
            .await
            .expect("recompute");
        assert_eq!(refreshed.as_str(), "value2");
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache: CacheStore<String, String> = CacheStore::with_default_ttl();

        let failed = cache
            .get_or_compute("key1".to_string(), || async {
                Err::<String, _>("upstream down".to_string())
            })
            .await;
        assert!(failed.is_err());
        assert!(cache.is_empty().await);

        let value = cache
            .get_or_compute("key1".to_string(), || ok("value1"))
            .await
            .expect("retry succeeds immediately");
        assert_eq!(value.as_str(), "value1");
    }

    #[tokio::test]
    async fn failed_keys_leave_no_slot_behind() {
        let cache: CacheStore<String, String> = CacheStore::with_default_ttl();

        for n in 0..5 {
            let _ = cache
                .get_or_compute(format!("missing{n}"), || async {
                    Err::<String, _>("not found".to_string())
                })
                .await;
        }

        assert!(cache.lock_slots().is_empty());
    }

    #[tokio::test]
    async fn failed_leader_keeps_slot_for_waiting_caller() {
        let cache: CacheStore<String, String> = CacheStore::with_default_ttl();

        let leader = cache.get_or_compute("key1".to_string(), || async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Err::<String, _>("down".to_string())
        });
        let follower = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            cache.get_or_compute("key1".to_string(), || ok("value1")).await
        };
        let (leader, follower) = tokio::join!(leader, follower);

        assert!(leader.is_err());
        assert_eq!(follower.expect("follower computes").as_str(), "value1");
        assert_eq!(cache.lock_slots().len(), 1);
        assert!(cache.get(&"key1".to_string()).await.is_some());
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_computation() {
        let cache: CacheStore<String, String> = CacheStore::with_default_ttl();
        let calls = Arc::new(AtomicUsize::new(0));

        let lookup = |cache: CacheStore<String, String>, calls: Arc<AtomicUsize>| async move {
            cache
                .get_or_compute("key1".to_string(), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    Ok::<_, String>("value1".to_string())
                })
                .await
        };

        let (a, b, c) = tokio::join!(
            lookup(cache.clone(), Arc::clone(&calls)),
            lookup(cache.clone(), Arc::clone(&calls)),
            lookup(cache.clone(), Arc::clone(&calls)),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let a = a.expect("a");
        assert!(Arc::ptr_eq(&a, &b.expect("b")));
        assert!(Arc::ptr_eq(&a, &c.expect("c")));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let cache: CacheStore<(String, u32), String> = CacheStore::with_default_ttl();

        cache
            .get_or_compute(("005930".to_string(), 30), || ok("thirty"))
            .await
            .expect("compute");
        let other = cache
            .get_or_compute(("005930".to_string(), 7), || ok("seven"))
            .await
            .expect("compute");

        assert_eq!(other.as_str(), "seven");
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn clear_expired_drops_only_stale_entries() {
        let cache: CacheStore<String, String> = CacheStore::new(Duration::from_millis(50));

        cache
            .get_or_compute("old".to_string(), || ok("a"))
            .await
            .expect("compute");
        tokio::time::sleep(Duration::from_millis(80)).await;
        cache
            .get_or_compute("new".to_string(), || ok("b"))
            .await
            .expect("compute");

        cache.clear_expired();

        assert_eq!(cache.len().await, 1);
        assert!(cache.get(&"new".to_string()).await.is_some());
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let cache: CacheStore<String, String> = CacheStore::with_default_ttl();
        cache
            .get_or_compute("key1".to_string(), || ok("a"))
            .await
            .expect("compute");

        cache.clear();
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn disabled_cache_always_computes() {
        let cache: CacheStore<String, String> = CacheStore::disabled();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            cache
                .get_or_compute("key1".to_string(), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    ok("value")
                })
                .await
                .expect("compute");
        }

        assert!(cache.is_disabled());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty().await);
    }
}

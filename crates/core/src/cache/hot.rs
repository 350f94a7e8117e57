//! In-process hot cache with per-entry TTL.
//!
//! Entries are keyed by query fingerprint. An entry whose deadline has passed
//! is treated as absent on read and removed lazily; `sweep` removes every
//! expired entry in one pass.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Default lifetime for hot entries (5 minutes).
pub const DEFAULT_HOT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    payload: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Counters reported by [`HotCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HotCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    /// Percentage of lookups that hit, rounded to the nearest integer.
    pub hit_rate: u64,
}

/// Thread-safe in-memory cache.
///
/// Uses [`DashMap`] so concurrent resolutions for different fingerprints do
/// not contend on a single lock. Hit and miss counters are atomics; each
/// `get` bumps exactly one of them.
#[derive(Debug)]
pub struct HotCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> Default for HotCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_HOT_TTL)
    }
}

impl<V: Clone> HotCache<V> {
    /// Create a cache whose `insert` uses `default_ttl`.
    pub fn new(default_ttl: Duration) -> Self {
        Self { entries: DashMap::new(), default_ttl, hits: AtomicU64::new(0), misses: AtomicU64::new(0) }
    }

    /// Store `payload` under `key` for `ttl`, replacing any existing entry.
    pub fn put(&self, key: &str, payload: V, ttl: Duration) {
        let entry = CacheEntry { payload, expires_at: Instant::now() + ttl };
        self.entries.insert(key.to_string(), entry);
        tracing::trace!(key, ttl_ms = ttl.as_millis() as u64, "hot cache put");
    }

    /// Store `payload` under `key` with the default TTL.
    pub fn insert(&self, key: &str, payload: V) {
        self.put(key, payload, self.default_ttl);
    }

    /// Look up `key`.
    ///
    /// Returns `None` if the key was never set or has expired; an expired
    /// entry is evicted on the way out.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();

        let (payload, expired) = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => (Some(entry.payload.clone()), false),
            Some(_) => (None, true),
            None => (None, false),
        };

        if expired {
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }

        if payload.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(key, "hot cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(key, expired, "hot cache miss");
        }

        payload
    }

    /// Remove `key`. Returns whether an entry was present.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        let size = self.entries.len();
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        tracing::debug!(size, "hot cache cleared");
    }

    /// Evict all expired entries, returning how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut evicted = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                evicted += 1;
            }
            keep
        });
        if evicted > 0 {
            tracing::debug!(evicted, "hot cache sweep");
        }
        evicted
    }

    /// Number of physically stored entries, including not yet swept ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> HotCacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        HotCacheStats { hits, misses, size: self.entries.len(), hit_rate: hit_rate(hits, misses) }
    }
}

/// `round(100 * hits / (hits + misses))`, or 0 before any lookup.
pub fn hit_rate(hits: u64, misses: u64) -> u64 {
    let total = hits + misses;
    if total == 0 {
        return 0;
    }
    (hits * 100 + total / 2) / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_put_and_get() {
        let cache = HotCache::new(Duration::from_secs(60));
        cache.insert("k", vec![1, 2, 3]);
        assert_eq!(cache.get("k"), Some(vec![1, 2, 3]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_missing() {
        let cache: HotCache<u32> = HotCache::default();
        assert!(cache.get("missing").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_after_ttl() {
        let cache = HotCache::default();
        cache.put("temp", "val", Duration::from_secs(1));

        tokio::time::advance(Duration::from_millis(1000)).await;
        assert_eq!(cache.get("temp"), Some("val"), "still present at the deadline");

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get("temp").is_none());
        assert!(cache.is_empty(), "expired entry is evicted on read");
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_resets_deadline() {
        let cache = HotCache::default();
        cache.put("k", 1, Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.put("k", 2, Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("k"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_counts_only_expired() {
        let cache = HotCache::default();
        cache.put("short", 1, Duration::from_secs(1));
        cache.put("long", 2, Duration::from_secs(3600));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.sweep(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_tracking() {
        let cache = HotCache::default();
        cache.get("miss1");
        cache.insert("hit1", "data");
        cache.get("hit1");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.hit_rate, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_and_clear() {
        let cache = HotCache::default();
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        cache.get("b");

        cache.clear();
        assert_eq!(cache.stats(), HotCacheStats { hits: 0, misses: 0, size: 0, hit_rate: 0 });
    }

    #[test]
    fn test_hit_rate_arithmetic() {
        assert_eq!(hit_rate(0, 0), 0);
        assert_eq!(hit_rate(1, 2), 33);
        assert_eq!(hit_rate(2, 1), 67);
        assert_eq!(hit_rate(1, 1), 50);
        assert_eq!(hit_rate(1, 7), 13);
        assert_eq!(hit_rate(5, 0), 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_access_keeps_counters_consistent() {
        let cache = Arc::new(HotCache::new(Duration::from_secs(60)));
        let mut handles = Vec::new();
        for worker in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                for i in 0..100 {
                    let key = format!("q{}", i % 10);
                    if worker % 2 == 0 {
                        cache.insert(&key, i);
                    }
                    cache.get(&key);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 800);
        assert!(stats.size <= 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sweep_count_ignores_concurrent_inserts() {
        let cache = Arc::new(HotCache::new(Duration::from_secs(60)));
        for i in 0..100 {
            cache.put(&format!("old{i}"), i, Duration::ZERO);
        }
        std::thread::sleep(Duration::from_millis(2));

        let writer = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                for i in 0..2000 {
                    cache.insert(&format!("new{i}"), i);
                }
            })
        };
        let evicted = cache.sweep();
        writer.await.unwrap();

        assert_eq!(evicted, 100);
        assert_eq!(cache.len(), 2000);
    }
}

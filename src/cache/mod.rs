//! TTL + LRU key/value cache used by settings, path, and editor-state
//! lookups.
//!
//! The store is deliberately small and observable: entries carry their own
//! TTL, expired entries are deleted the moment a read sees them, and when
//! the store is full inserting a new key evicts exactly the globally
//! least-recently-used entry. A periodic sweep task bounds growth from keys
//! that are written but never read again.
//!
//! Failure semantics: no cache operation ever propagates an error to the
//! caller. Internal problems are logged and degrade to `false`/`None`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::constants::{
    CACHE_SWEEP_INTERVAL, DEFAULT_CACHE_TTL, EDITOR_STATE_TTL, MAX_CACHE_ENTRIES,
    PROJECT_PATH_TTL, SETTINGS_TTL,
};
use crate::validate;

/// Configuration for a cache store.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before LRU eviction.
    pub max_entries: usize,
    /// TTL applied when `set` is called without one.
    pub default_ttl: Duration,
    /// Interval between periodic expiry sweeps.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: MAX_CACHE_ENTRIES,
            default_ttl: DEFAULT_CACHE_TTL,
            sweep_interval: CACHE_SWEEP_INTERVAL,
        }
    }
}

/// Point-in-time view of cache counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Hit rate in percent over all `get` calls.
    pub hit_rate: f64,
}

struct CacheEntry<T> {
    data: T,
    inserted_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) > self.ttl
    }
}

/// Entries and access timestamps live under one lock so they can never
/// drift out of lockstep.
struct CacheMap<T> {
    entries: HashMap<String, CacheEntry<T>>,
    access: HashMap<String, Instant>,
}

struct CacheInner<T> {
    map: Mutex<CacheMap<T>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<T> Drop for CacheInner<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
    }
}

/// Shared TTL+LRU store. Cloning is cheap and clones share the same data.
pub struct CacheStore<T> {
    inner: Arc<CacheInner<T>>,
}

impl<T> Clone for CacheStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> Default for CacheStore<T> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<T: Clone + Send + 'static> CacheStore<T> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                map: Mutex::new(CacheMap {
                    entries: HashMap::new(),
                    access: HashMap::new(),
                }),
                config,
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                evictions: AtomicU64::new(0),
                expirations: AtomicU64::new(0),
                sweeper: Mutex::new(None),
            }),
        }
    }

    /// Insert or overwrite an entry. At capacity, a new key evicts the
    /// least-recently-used entry first. Returns `false` instead of failing
    /// when the TTL is unusable.
    pub fn set(&self, key: &str, data: T, ttl: Option<Duration>) -> bool {
        let ttl = ttl.unwrap_or(self.inner.config.default_ttl);
        if let Err(err) = validate::ttl(ttl) {
            warn!(key, %err, "cache set dropped");
            return false;
        }

        let now = Instant::now();
        let mut map = self.inner.map.lock();
        if !map.entries.contains_key(key) && map.entries.len() >= self.inner.config.max_entries {
            self.evict_lru(&mut map);
        }
        map.entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                inserted_at: now,
                ttl,
            },
        );
        map.access.insert(key.to_string(), now);
        true
    }

    /// Return the value if present and unexpired. Expired entries are
    /// deleted as a side effect. A hit refreshes the access timestamp.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let mut map = self.inner.map.lock();
        match map.entries.get(key) {
            None => {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Some(entry) if entry.is_expired(now) => {
                map.entries.remove(key);
                map.access.remove(key);
                self.inner.expirations.fetch_add(1, Ordering::Relaxed);
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Some(entry) => {
                let data = entry.data.clone();
                map.access.insert(key.to_string(), now);
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                Some(data)
            }
        }
    }

    /// Expiry semantics of `get`, but without refreshing the access
    /// timestamp and without touching the hit/miss counters.
    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut map = self.inner.map.lock();
        match map.entries.get(key) {
            None => false,
            Some(entry) if entry.is_expired(now) => {
                map.entries.remove(key);
                map.access.remove(key);
                self.inner.expirations.fetch_add(1, Ordering::Relaxed);
                false
            }
            Some(_) => true,
        }
    }

    /// Remove an entry. Returns whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        let mut map = self.inner.map.lock();
        map.access.remove(key);
        map.entries.remove(key).is_some()
    }

    /// Drop every entry. Counters are preserved.
    pub fn clear(&self) {
        let mut map = self.inner.map.lock();
        map.entries.clear();
        map.access.clear();
    }

    /// Number of live entries (expired-but-unswept entries included).
    pub fn len(&self) -> usize {
        self.inner.map.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete every expired entry regardless of access pattern. Returns the
    /// number removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut map = self.inner.map.lock();
        let before = map.entries.len();
        let CacheMap { entries, access } = &mut *map;
        entries.retain(|_, entry| !entry.is_expired(now));
        access.retain(|key, _| entries.contains_key(key));
        let removed = before - map.entries.len();
        if removed > 0 {
            self.inner
                .expirations
                .fetch_add(removed as u64, Ordering::Relaxed);
            debug!(removed, "cache sweep");
        }
        removed
    }

    /// Start the periodic sweep task. Replaces any previous sweeper. The
    /// task holds only a weak reference and exits when the store is dropped
    /// or [`dispose`](Self::dispose) is called.
    pub fn start_sweeper(&self) {
        let weak: Weak<CacheInner<T>> = Arc::downgrade(&self.inner);
        let interval = self.inner.config.sweep_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { return };
                let store = CacheStore { inner };
                store.sweep();
            }
        });
        if let Some(previous) = self.inner.sweeper.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Stop the sweeper and drop all entries.
    pub fn dispose(&self) {
        if let Some(handle) = self.inner.sweeper.lock().take() {
            handle.abort();
        }
        self.clear();
    }

    /// Counter snapshot.
    pub fn stats(&self) -> CacheStats {
        let hits = self.inner.hits.load(Ordering::Relaxed);
        let misses = self.inner.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64 * 100.0
        };
        CacheStats {
            entries: self.len(),
            hits,
            misses,
            evictions: self.inner.evictions.load(Ordering::Relaxed),
            expirations: self.inner.expirations.load(Ordering::Relaxed),
            hit_rate,
        }
    }

    /// Handle that prefixes keys and applies a namespace default TTL.
    pub fn namespace(&self, prefix: &'static str, default_ttl: Duration) -> Namespace<T> {
        Namespace {
            store: self.clone(),
            prefix,
            default_ttl,
        }
    }

    /// `settings:` namespace — host settings lookups.
    pub fn settings(&self) -> Namespace<T> {
        self.namespace("settings:", SETTINGS_TTL)
    }

    /// `project_path:` namespace — filesystem existence checks.
    pub fn project_path(&self) -> Namespace<T> {
        self.namespace("project_path:", PROJECT_PATH_TTL)
    }

    /// `editor_state:` namespace — resolved editor lookups.
    pub fn editor_state(&self) -> Namespace<T> {
        self.namespace("editor_state:", EDITOR_STATE_TTL)
    }

    /// Evict the entry with the oldest access timestamp. Caller holds the
    /// map lock.
    fn evict_lru(&self, map: &mut CacheMap<T>) {
        let victim = map
            .access
            .iter()
            .min_by_key(|(_, at)| **at)
            .map(|(key, _)| key.clone());
        if let Some(key) = victim {
            map.entries.remove(&key);
            map.access.remove(&key);
            self.inner.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(key, "cache evicted lru entry");
        }
    }
}

/// Key-prefixing view over a [`CacheStore`] with a namespace default TTL.
#[derive(Clone)]
pub struct Namespace<T> {
    store: CacheStore<T>,
    prefix: &'static str,
    default_ttl: Duration,
}

impl<T: Clone + Send + 'static> Namespace<T> {
    pub fn get(&self, key: &str) -> Option<T> {
        self.store.get(&self.key(key))
    }

    pub fn set(&self, key: &str, data: T) -> bool {
        self.store.set(&self.key(key), data, Some(self.default_ttl))
    }

    pub fn set_with_ttl(&self, key: &str, data: T, ttl: Duration) -> bool {
        self.store.set(&self.key(key), data, Some(ttl))
    }

    pub fn delete(&self, key: &str) -> bool {
        self.store.delete(&self.key(key))
    }

    pub fn has(&self, key: &str) -> bool {
        self.store.has(&self.key(key))
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

/// Wrap `f` so results are served from `store` while fresh.
///
/// The explicit higher-order form of a "cacheable method": consult the
/// store under `key_fn(&args)`, delegate on a miss, and store the result
/// with `ttl`.
pub fn cached<A, T, K, F>(
    store: CacheStore<T>,
    ttl: Duration,
    key_fn: K,
    f: F,
) -> impl Fn(A) -> T
where
    T: Clone + Send + 'static,
    K: Fn(&A) -> String,
    F: Fn(A) -> T,
{
    move |args: A| {
        let key = key_fn(&args);
        if let Some(hit) = store.get(&key) {
            return hit;
        }
        let value = f(args);
        store.set(&key, value.clone(), Some(ttl));
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn small_store(max_entries: usize) -> CacheStore<u32> {
        CacheStore::new(CacheConfig {
            max_entries,
            ..CacheConfig::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn value_visible_until_ttl_then_removed() {
        let store = small_store(10);
        assert!(store.set("k", 42, Some(Duration::from_millis(100))));

        tokio::time::advance(Duration::from_millis(50)).await;
        assert_eq!(store.get("k"), Some(42));

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(store.get("k"), None);
        // Expiry deletes the entry as a side effect.
        assert_eq!(store.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn insert_at_capacity_evicts_exactly_the_lru_entry() {
        let store = small_store(3);
        store.set("a", 1, None);
        tokio::time::advance(Duration::from_millis(1)).await;
        store.set("b", 2, None);
        tokio::time::advance(Duration::from_millis(1)).await;
        store.set("c", 3, None);
        tokio::time::advance(Duration::from_millis(1)).await;

        // Touch "a" so "b" becomes the globally least-recently-used key.
        assert_eq!(store.get("a"), Some(1));
        tokio::time::advance(Duration::from_millis(1)).await;

        store.set("d", 4, None);
        assert_eq!(store.len(), 3);
        assert!(!store.has("b"));
        assert!(store.has("a"));
        assert!(store.has("c"));
        assert!(store.has("d"));
        assert_eq!(store.stats().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn overwriting_existing_key_at_capacity_does_not_evict() {
        let store = small_store(2);
        store.set("a", 1, None);
        store.set("b", 2, None);
        store.set("a", 10, None);
        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().evictions, 0);
        assert_eq!(store.get("a"), Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn has_does_not_refresh_access_timestamp() {
        let store = small_store(2);
        store.set("a", 1, None);
        tokio::time::advance(Duration::from_millis(1)).await;
        store.set("b", 2, None);
        tokio::time::advance(Duration::from_millis(1)).await;

        // `has` must not promote "a" above "b".
        assert!(store.has("a"));
        store.set("c", 3, None);

        assert!(!store.has("a"));
        assert!(store.has("b"));
        assert!(store.has("c"));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_expired_entries_never_read_again() {
        let store = small_store(10);
        store.set("stale", 1, Some(Duration::from_millis(50)));
        store.set("fresh", 2, Some(Duration::from_secs(300)));

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(store.sweep(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.has("fresh"));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_task_runs_on_interval() {
        let store = small_store(10);
        store.set("stale", 1, Some(Duration::from_secs(1)));
        store.start_sweeper();

        // Past the sweep interval; the entry was never read.
        tokio::time::sleep(CACHE_SWEEP_INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(store.len(), 0);
        store.dispose();
    }

    #[tokio::test(start_paused = true)]
    async fn stats_track_hits_misses_and_rate() {
        let store = small_store(10);
        store.set("k", 1, None);
        assert_eq!(store.get("k"), Some(1));
        assert_eq!(store.get("missing"), None);

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_and_clear() {
        let store = small_store(10);
        store.set("a", 1, None);
        store.set("b", 2, None);
        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        store.clear();
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn set_with_zero_ttl_is_dropped_not_propagated() {
        let store = small_store(10);
        assert!(!store.set("k", 1, Some(Duration::ZERO)));
        assert!(!store.has("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn namespace_prefixes_keys_and_applies_default_ttl() {
        let store: CacheStore<String> = CacheStore::default();
        let settings = store.settings();
        settings.set("editors", "v1".to_string());

        assert!(store.has("settings:editors"));
        assert_eq!(settings.get("editors"), Some("v1".to_string()));

        // The settings namespace default TTL is 1s.
        tokio::time::advance(Duration::from_millis(1100)).await;
        assert_eq!(settings.get("editors"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn cached_wrapper_serves_from_store_while_fresh() {
        let store: CacheStore<u32> = CacheStore::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let lookup = cached(
            store,
            Duration::from_millis(100),
            |n: &u32| format!("double:{n}"),
            move |n: u32| {
                counter.fetch_add(1, Ordering::SeqCst);
                n * 2
            },
        );

        assert_eq!(lookup(21), 42);
        assert_eq!(lookup(21), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_millis(150)).await;
        assert_eq!(lookup(21), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

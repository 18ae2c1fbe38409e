//! Bounded, TTL- and reliability-aware cache of healed locators
//!
//! Access-ordered with LRU eviction at capacity. A `get` re-validates the
//! entry: expired or unreliable entries are removed and reported as misses.
//! Reliability is fed back by the caller through [`HealCache::record_usage`]
//! after it has tried the healed locator for real.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use healer_core_types::Candidate;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

const DEFAULT_CAPACITY: usize = 500;
const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Entries with at least this many uses and under 50% success are purged.
const UNRELIABLE_MIN_USES: u32 = 3;
const UNRELIABLE_RATE: f64 = 0.5;

/// Cache sizing and expiry configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: DEFAULT_TTL,
        }
    }
}

/// A cached healed locator with usage statistics.
#[derive(Debug, Clone)]
pub struct CachedHeal {
    pub candidate: Candidate,
    pub cache_key: String,
    created_at: Instant,
    last_used_at: Instant,
    pub use_count: u32,
    pub success_count: u32,
    pub failure_count: u32,
}

impl CachedHeal {
    fn new(candidate: Candidate, cache_key: String) -> Self {
        let now = Instant::now();
        Self {
            candidate,
            cache_key,
            created_at: now,
            last_used_at: now,
            use_count: 0,
            success_count: 0,
            failure_count: 0,
        }
    }

    fn record_use(&mut self, success: bool) {
        self.use_count += 1;
        self.last_used_at = Instant::now();
        if success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
    }

    /// Fraction of recorded uses that succeeded; 0 when never used.
    pub fn success_rate(&self) -> f64 {
        if self.use_count == 0 {
            0.0
        } else {
            f64::from(self.success_count) / f64::from(self.use_count)
        }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }

    pub fn is_unreliable(&self) -> bool {
        self.use_count >= UNRELIABLE_MIN_USES && self.success_rate() < UNRELIABLE_RATE
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn idle(&self) -> Duration {
        self.last_used_at.elapsed()
    }
}

/// Aggregate cache statistics, serializable for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub ttl_ms: u64,
    pub enabled: bool,
    pub total_uses: u64,
    pub total_successes: u64,
    pub overall_success_rate: f64,
}

struct Inner {
    entries: LruCache<String, CachedHeal>,
    ttl: Duration,
    enabled: bool,
}

enum Eviction {
    Expired,
    Unreliable(f64),
}

/// Key → healed-candidate store shared by concurrent healing callers.
pub struct HealCache {
    inner: Mutex<Inner>,
}

impl HealCache {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                ttl: config.ttl,
                enabled: true,
            }),
        }
    }

    /// Look up a healed locator, re-validating TTL and reliability.
    ///
    /// Marks the entry as most recently used on a hit. Expired or unreliable
    /// entries are removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<CachedHeal> {
        let mut inner = self.inner.lock();
        if !inner.enabled {
            return None;
        }
        let ttl = inner.ttl;

        let eviction = match inner.entries.get(key) {
            None => return None,
            Some(entry) if entry.is_expired(ttl) => Eviction::Expired,
            Some(entry) if entry.is_unreliable() => Eviction::Unreliable(entry.success_rate()),
            Some(entry) => return Some(entry.clone()),
        };

        inner.entries.pop(key);
        match eviction {
            Eviction::Expired => info!(key, "cache entry expired"),
            Eviction::Unreliable(rate) => {
                info!(key, success_rate = rate, "cache entry invalidated as unreliable")
            }
        }
        None
    }

    /// Insert a freshly healed candidate, overwriting any prior entry for
    /// the key and evicting the least-recently-used entry at capacity.
    pub fn put(&self, key: &str, candidate: Candidate) {
        let mut inner = self.inner.lock();
        if !inner.enabled {
            return;
        }
        inner
            .entries
            .put(key.to_string(), CachedHeal::new(candidate, key.to_string()));
        debug!(key, "cached healed locator");
    }

    /// Record whether the cached locator actually worked for the caller.
    /// No-op when the key is absent.
    pub fn record_usage(&self, key: &str, success: bool) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.record_use(success);
            if !success {
                debug!(key, success_rate = entry.success_rate(), "cache usage recorded");
            }
        }
    }

    /// Remove a specific entry.
    pub fn invalidate(&self, key: &str) {
        let mut inner = self.inner.lock();
        if inner.entries.pop(key).is_some() {
            info!(key, "cache entry invalidated");
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let size = inner.entries.len();
        inner.entries.clear();
        info!(removed = size, "cache cleared");
    }

    /// Disabling also clears all entries; while disabled, `get` and `put`
    /// are no-ops.
    pub fn set_enabled(&self, enabled: bool) {
        let mut inner = self.inner.lock();
        inner.enabled = enabled;
        if !enabled {
            inner.entries.clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.lock().enabled
    }

    pub fn set_ttl(&self, ttl: Duration) {
        self.inner.lock().ttl = ttl;
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut total_uses = 0u64;
        let mut total_successes = 0u64;
        for (_, entry) in inner.entries.iter() {
            total_uses += u64::from(entry.use_count);
            total_successes += u64::from(entry.success_count);
        }
        CacheStats {
            size: inner.entries.len(),
            capacity: inner.entries.cap().get(),
            ttl_ms: inner.ttl.as_millis() as u64,
            enabled: inner.enabled,
            total_uses,
            total_successes,
            overall_success_rate: if total_uses > 0 {
                total_successes as f64 / total_uses as f64
            } else {
                0.0
            },
        }
    }
}

impl Default for HealCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use healer_core_types::{LocatorKind, Platform};

    fn candidate(value: &str) -> Candidate {
        Candidate::new(LocatorKind::Id, value, 0.9, Platform::Android)
    }

    #[test]
    fn test_put_then_get_roundtrip() {
        let cache = HealCache::default();
        cache.put("id||login", candidate("login_v2"));

        let hit = cache.get("id||login").expect("fresh entry should hit");
        assert_eq!(hit.candidate.value, "login_v2");
        assert_eq!(hit.use_count, 0);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = HealCache::default();
        cache.put("k", candidate("v"));
        cache.set_ttl(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(5));

        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_unreliable_entry_is_purged_on_get() {
        let cache = HealCache::default();
        cache.put("k", candidate("v"));
        cache.record_usage("k", true);
        cache.record_usage("k", false);
        cache.record_usage("k", false);

        // 1/3 success rate with 3 uses crosses the unreliability bar
        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_usage_counters_stay_consistent() {
        let cache = HealCache::default();
        cache.put("k", candidate("v"));
        cache.record_usage("k", true);
        cache.record_usage("k", true);
        cache.record_usage("k", false);

        let entry = cache.get("k").unwrap();
        assert_eq!(entry.use_count, entry.success_count + entry.failure_count);
        assert!((entry.success_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_lru_eviction_at_capacity() {
        let cache = HealCache::new(CacheConfig {
            capacity: 2,
            ..Default::default()
        });
        cache.put("a", candidate("1"));
        cache.put("b", candidate("2"));
        // Touch "a" so "b" becomes least recently used
        assert!(cache.get("a").is_some());
        cache.put("c", candidate("3"));

        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_record_usage_on_absent_key_is_noop() {
        let cache = HealCache::default();
        cache.record_usage("missing", true);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_overwrites_with_zero_usage() {
        let cache = HealCache::default();
        cache.put("k", candidate("old"));
        cache.record_usage("k", true);
        cache.put("k", candidate("new"));

        let entry = cache.get("k").unwrap();
        assert_eq!(entry.candidate.value, "new");
        assert_eq!(entry.use_count, 0);
    }

    #[test]
    fn test_disable_clears_and_suspends() {
        let cache = HealCache::default();
        cache.put("k", candidate("v"));
        cache.set_enabled(false);

        assert!(cache.get("k").is_none());
        cache.put("k2", candidate("v2"));
        assert_eq!(cache.len(), 0);

        cache.set_enabled(true);
        cache.put("k3", candidate("v3"));
        assert!(cache.get("k3").is_some());
    }

    #[test]
    fn test_stats_aggregation() {
        let cache = HealCache::default();
        cache.put("a", candidate("1"));
        cache.put("b", candidate("2"));
        cache.record_usage("a", true);
        cache.record_usage("b", false);

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.capacity, DEFAULT_CAPACITY);
        assert_eq!(stats.total_uses, 2);
        assert_eq!(stats.total_successes, 1);
        assert!((stats.overall_success_rate - 0.5).abs() < 1e-9);
    }
}

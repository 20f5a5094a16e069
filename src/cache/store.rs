//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with hybrid eviction and TTL expiration.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::cache::eviction::{expired_batch, EvictionPolicy};
use crate::cache::{namespace_of, CacheEntry, CacheStats, NAMESPACE_DELIMITER};

// == Cache Store ==
/// Main cache storage with hybrid LFU/LRU eviction and TTL support.
///
/// Not synchronized; share it through [`Cache`](crate::cache::Cache).
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_size: usize,
    /// TTL for entries stored without an explicit one
    default_ttl: Duration,
    /// Randomness for the eviction policy draw
    rng: StdRng,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// A `max_size` of zero is raised to one.
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self::with_rng(max_size, default_ttl, StdRng::from_os_rng())
    }

    /// Creates a store whose eviction draws are reproducible.
    pub fn with_seed(max_size: usize, default_ttl: Duration, seed: u64) -> Self {
        Self::with_rng(max_size, default_ttl, StdRng::seed_from_u64(seed))
    }

    fn with_rng(max_size: usize, default_ttl: Duration, rng: StdRng) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            max_size: max_size.max(1),
            default_ttl,
            rng,
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if found and not expired.
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<V> {
        match self.entries.get_mut(key) {
            None => {
                self.stats.record_miss();
                debug!(key, "cache miss");
                return None;
            }
            Some(entry) if !entry.is_expired() => {
                entry.access();
                self.stats.record_hit();
                debug!(key, access_count = entry.access_count, "cache hit");
                return Some(entry.value.clone());
            }
            Some(_) => {}
        }

        self.entries.remove(key);
        self.stats.record_expirations(1);
        self.stats.record_miss();
        debug!(key, "cache miss (expired)");
        None
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// If the key already exists, the value is overwritten and its TTL and
    /// access metadata are reset. If the key is new and the cache is at
    /// capacity, room is made first.
    ///
    /// A missing or zero `ttl` uses the default TTL.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.evict();
        }

        let ttl = ttl
            .filter(|ttl| !ttl.is_zero())
            .unwrap_or(self.default_ttl);
        let entry = CacheEntry::new(key.clone(), value, ttl);
        self.entries.insert(key, entry);
        self.stats.record_set();
    }

    // == Delete ==
    /// Removes an entry by key.
    ///
    /// Returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.stats.record_deletes(1);
            true
        } else {
            false
        }
    }

    // == Delete Pattern ==
    /// Removes every key containing `pattern` as a literal substring.
    ///
    /// Returns the number of entries removed.
    pub fn delete_pattern(&mut self, pattern: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.contains(pattern));
        let removed = before - self.entries.len();

        self.stats.record_deletes(removed);
        if removed > 0 {
            debug!(pattern, removed, "deleted keys by pattern");
        }
        removed
    }

    // == Delete Namespace ==
    /// Removes every key in `namespace`, i.e. every key starting with `"{namespace}:"`.
    ///
    /// Anchored at the start of the key, so `"ns"` leaves `"other:ns:1"` alone.
    pub fn delete_namespace(&mut self, namespace: &str) -> usize {
        let prefix = format!("{}{}", namespace, NAMESPACE_DELIMITER);
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(&prefix));
        let removed = before - self.entries.len();

        self.stats.record_deletes(removed);
        if removed > 0 {
            debug!(namespace, removed, "deleted namespace");
        }
        removed
    }

    // == Clear ==
    /// Removes all entries, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.stats.record_deletes(removed);
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut namespaces: BTreeMap<String, usize> = BTreeMap::new();
        for key in self.entries.keys() {
            *namespaces.entry(namespace_of(key).to_string()).or_default() += 1;
        }

        let mut stats = self.stats.clone();
        stats.refresh(self.entries.len(), namespaces);
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - self.entries.len();

        self.stats.record_expirations(removed);
        self.stats.record_cleanup();
        removed
    }

    // == Evict ==
    /// Makes room for one new key.
    ///
    /// Reclaims a batch of expired entries if there are any, otherwise
    /// removes a single victim picked by the hybrid LFU/LRU policy.
    fn evict(&mut self) {
        let expired = expired_batch(&self.entries, Instant::now());
        if !expired.is_empty() {
            for key in &expired {
                self.entries.remove(key);
            }
            self.stats.record_evictions(expired.len());
            debug!(count = expired.len(), "evicted expired entries");
            return;
        }

        let policy = EvictionPolicy::choose(&mut self.rng);
        if let Some(victim) = policy.select_victim(&self.entries) {
            self.entries.remove(&victim);
            self.stats.record_evictions(1);
            debug!(key = %victim, ?policy, "evicted entry");
        }
    }

    // == Contains Key ==
    /// Returns true if a live entry exists for `key`.
    ///
    /// Does not touch access metadata or statistics.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    // == Length ==
    /// Returns the current number of entries in the cache, expired ones included
    /// until they are reclaimed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Capacity, never below 1.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// TTL applied when `set` gets none.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Read-only view of an entry's metadata, expired or not.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }
}

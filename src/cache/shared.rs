//! Shared Cache Handle
//!
//! Thread-safe handle around a [`CacheStore`], cloned into every call site
//! that needs the cache.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::{CacheStats, CacheStore};
use crate::config::Config;

// == Cache ==
/// Cloneable, thread-safe cache handle.
///
/// Every operation holds the store lock for its critical section only. No
/// I/O and no caller code runs under the lock.
#[derive(Debug)]
pub struct Cache<V> {
    store: Arc<Mutex<CacheStore<V>>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<V: Clone> Cache<V> {
    /// Creates a new cache with the given capacity and default TTL.
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self::from_store(CacheStore::new(max_size, default_ttl))
    }

    /// Creates a cache whose eviction draws are reproducible.
    pub fn with_seed(max_size: usize, default_ttl: Duration, seed: u64) -> Self {
        Self::from_store(CacheStore::with_seed(max_size, default_ttl, seed))
    }

    /// Creates a new cache from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_size, config.default_ttl_duration())
    }

    /// Wraps an existing store.
    pub fn from_store(store: CacheStore<V>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    // == Get ==
    /// Returns a clone of the live value for `key`.
    pub fn get(&self, key: &str) -> Option<V> {
        self.store.lock().get(key)
    }

    // == Set ==
    /// Stores `value` under `key`, evicting one entry first when a new key
    /// meets a full cache.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        self.store.lock().set(key, value, ttl);
    }

    // == Delete ==
    /// Removes `key`, returning whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.store.lock().delete(key)
    }

    /// Removes every key containing `pattern`.
    pub fn delete_pattern(&self, pattern: &str) -> usize {
        self.store.lock().delete_pattern(pattern)
    }

    /// Removes every key starting with `"{namespace}:"`.
    pub fn delete_namespace(&self, namespace: &str) -> usize {
        self.store.lock().delete_namespace(namespace)
    }

    // == Clear ==
    /// Removes every entry, returning how many there were.
    pub fn clear(&self) -> usize {
        self.store.lock().clear()
    }

    // == Stats ==
    /// Snapshot of counters, entry count and namespace breakdown.
    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    /// Removes every expired entry in one pass.
    pub fn cleanup_expired(&self) -> usize {
        self.store.lock().cleanup_expired()
    }

    /// Whether `key` holds a live value. Touches no counters.
    pub fn contains_key(&self, key: &str) -> bool {
        self.store.lock().contains_key(key)
    }

    /// Number of stored entries, expired ones included until removed.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    /// Runs `f` with exclusive access to the underlying store.
    ///
    /// The lock is not re-entrant: calling any method of this cache, or of a
    /// clone, from inside `f` deadlocks.
    #[cfg(test)]
    pub(crate) fn with_store<R>(&self, f: impl FnOnce(&mut CacheStore<V>) -> R) -> R {
        f(&mut *self.store.lock())
    }
}

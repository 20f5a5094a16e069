//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
///
/// Counters only ever grow for the lifetime of the store. The remaining
/// fields are refreshed when a snapshot is taken.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of stores, new keys and overwrites alike
    pub sets: u64,
    /// Number of entries removed by explicit deletion
    pub deletes: u64,
    /// Number of entries removed to make room for a new key
    pub evictions: u64,
    /// Number of completed cleanup runs
    pub cleanups: u64,
    /// Number of entries dropped because their TTL elapsed
    pub expirations: u64,
    /// hits / (hits + misses), 0.0 before the first read
    pub hit_ratio: f64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Entry count per namespace
    pub namespaces: BTreeMap<String, usize>,
    /// Wall-clock time of the last cleanup run
    pub last_cleanup_at: Option<DateTime<Utc>>,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
        self.update_hit_ratio();
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.update_hit_ratio();
    }

    /// Counts one store, new key or overwrite.
    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    /// Counts explicitly deleted entries.
    pub fn record_deletes(&mut self, count: usize) {
        self.deletes += count as u64;
    }

    /// Counts entries removed to make room.
    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    /// Counts entries dropped because their TTL elapsed.
    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    // == Record Cleanup ==
    /// Counts one cleanup run and stamps its time.
    pub fn record_cleanup(&mut self) {
        self.cleanups += 1;
        self.last_cleanup_at = Some(Utc::now());
    }

    // == Refresh ==
    /// Updates the point-in-time fields of a snapshot.
    pub fn refresh(&mut self, total_entries: usize, namespaces: BTreeMap<String, usize>) {
        self.total_entries = total_entries;
        self.namespaces = namespaces;
    }

    fn update_hit_ratio(&mut self) {
        let total = self.hits + self.misses;
        self.hit_ratio = if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        };
    }
}

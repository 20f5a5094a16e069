//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and access tracking.

use std::time::{Duration, Instant};

use crate::cache::MAX_TTL;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Key this entry is stored under
    pub key: String,
    /// The stored value
    pub value: V,
    /// Insertion time
    pub created_at: Instant,
    /// Expiration time, `created_at + ttl`
    pub expires_at: Instant,
    /// Number of successful reads
    pub access_count: u64,
    /// Time of the most recent successful read, `created_at` until then
    pub last_accessed_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    ///
    /// TTLs above [`MAX_TTL`] are clamped.
    pub fn new(key: impl Into<String>, value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            key: key.into(),
            value,
            created_at: now,
            expires_at: now + ttl.min(MAX_TTL),
            access_count: 0,
            last_accessed_at: now,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: the entry is expired once the current time reaches
    /// `expires_at`, so a value set with a TTL is never served at or after
    /// that TTL has fully elapsed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a caller-supplied clock
    /// reading, so scans over many entries use one consistent `now`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Access ==
    /// Records a successful read.
    pub fn access(&mut self) {
        self.access_count += 1;
        self.last_accessed_at = Instant::now();
    }

    // == Time To Live ==
    /// Returns remaining TTL, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Time since insertion.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

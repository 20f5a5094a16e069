//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, hybrid LFU/LRU eviction
//! and namespace invalidation.

mod entry;
mod eviction;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use eviction::{EvictionPolicy, LFU_PROBABILITY};
pub use shared::Cache;
pub use stats::CacheStats;
pub use store::CacheStore;

use std::time::Duration;

// == Public Constants ==
/// Separates a key's namespace from the rest of the key
pub const NAMESPACE_DELIMITER: char = ':';

/// Namespace reported for keys without a delimiter
pub const DEFAULT_NAMESPACE: &str = "_default_";

/// Longest TTL an entry can carry
pub const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Returns the namespace of `key`: the text before the first delimiter, or
/// [`DEFAULT_NAMESPACE`] when there is none.
pub fn namespace_of(key: &str) -> &str {
    key.split_once(NAMESPACE_DELIMITER)
        .map_or(DEFAULT_NAMESPACE, |(namespace, _)| namespace)
}

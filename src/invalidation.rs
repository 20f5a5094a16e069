//! Cache Invalidation Helpers
//!
//! Called by domain code after it mutates the data behind cached results.
//!
//! Any code path that caches listings or searches over an entity type
//! registers its namespace with an [`Invalidator`], so invalidating one entity
//! also drops the aggregates that may reference it.

use std::collections::BTreeSet;

use tracing::info;

use crate::cache::Cache;

/// Marker preceding an entity id inside cache keys, e.g. `pattern:entity:42:detail`
pub const ENTITY_MARKER: &str = "entity";

// == Invalidate Cache ==
/// Drops every entry in `namespace`.
pub fn invalidate_cache<V: Clone>(cache: &Cache<V>, namespace: &str) -> usize {
    let removed = cache.delete_namespace(namespace);
    info!(namespace, removed, "invalidated cache namespace");
    removed
}

/// Key fragment identifying one entity.
pub fn entity_key(entity_id: impl std::fmt::Display) -> String {
    format!("{}:{}", ENTITY_MARKER, entity_id)
}

// == Invalidator ==
/// Invalidates entities together with the aggregate namespaces registered for them.
#[derive(Debug, Clone)]
pub struct Invalidator<V> {
    cache: Cache<V>,
    aggregate_namespaces: BTreeSet<String>,
}

impl<V: Clone> Invalidator<V> {
    pub fn new(cache: &Cache<V>) -> Self {
        Self {
            cache: cache.clone(),
            aggregate_namespaces: BTreeSet::new(),
        }
    }

    /// Registers a namespace of listings or searches to drop on every entity
    /// invalidation.
    pub fn register_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.aggregate_namespaces.insert(namespace.into());
        self
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.aggregate_namespaces.iter().map(String::as_str)
    }

    pub fn invalidate_cache(&self, namespace: &str) -> usize {
        invalidate_cache(&self.cache, namespace)
    }

    // == Invalidate Entity ==
    /// Drops every key mentioning the entity plus every registered aggregate
    /// namespace. Returns the total number of entries removed.
    pub fn invalidate_entity_cache(&self, entity_id: impl std::fmt::Display) -> usize {
        let marker = entity_key(entity_id);
        let mut removed = self.cache.delete_pattern(&marker);
        for namespace in &self.aggregate_namespaces {
            removed += self.cache.delete_namespace(namespace);
        }

        info!(entity = %marker, removed, "invalidated entity cache");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn seeded_cache() -> Cache<u32> {
        let cache = Cache::with_seed(100, Duration::from_secs(300), 17);
        cache.set("patterns:entity:7:detail", 1, None);
        cache.set("gdpr:entity:7", 2, None);
        cache.set("patterns:entity:8:detail", 3, None);
        cache.set("pattern_list:page:1", 4, None);
        cache.set("pattern_search:q:privacy", 5, None);
        cache.set("newsletter:1", 6, None);
        cache
    }

    #[test]
    fn test_invalidate_cache() {
        let cache = seeded_cache();

        assert_eq!(invalidate_cache(&cache, "patterns"), 2);
        assert_eq!(invalidate_cache(&cache, "patterns"), 0);
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_entity_key() {
        assert_eq!(entity_key(42), "entity:42");
        assert_eq!(entity_key("abc"), "entity:abc");
    }

    #[test]
    fn test_invalidate_entity_with_aggregates() {
        let cache = seeded_cache();
        let mut invalidator = Invalidator::new(&cache);
        invalidator
            .register_namespace("pattern_list")
            .register_namespace("pattern_search");

        assert_eq!(invalidator.invalidate_entity_cache(7), 4);

        assert!(cache.contains_key("patterns:entity:8:detail"));
        assert!(cache.contains_key("newsletter:1"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_entity_marker_is_a_literal_substring() {
        let cache: Cache<u32> = Cache::with_seed(100, Duration::from_secs(300), 17);
        cache.set("patterns:entity:7", 1, None);
        cache.set("patterns:entity:77", 2, None);
        let invalidator = Invalidator::new(&cache);

        // "entity:7" is a substring of "entity:77", so both go
        assert_eq!(invalidator.invalidate_entity_cache(7), 2);
    }

    #[test]
    fn test_namespaces_are_deduplicated() {
        let cache = seeded_cache();
        let mut invalidator = Invalidator::new(&cache);
        invalidator
            .register_namespace("pattern_list")
            .register_namespace("pattern_list");

        assert_eq!(invalidator.namespaces().collect::<Vec<_>>(), vec!["pattern_list"]);
        assert_eq!(invalidator.invalidate_cache("gdpr"), 1);
    }
}

//! Eviction Policy Module
//!
//! Picks which entries make room when a new key arrives at capacity.
//!
//! Expired entries are reclaimed first, in batches of a tenth of the expired
//! set. With nothing expired a single victim is chosen, by access frequency
//! most of the time and by recency otherwise, so entries that were popular
//! once but are no longer read still age out.

use std::collections::HashMap;
use std::time::Instant;

use rand::Rng;

use crate::cache::CacheEntry;

/// Probability of evicting by lowest access count rather than oldest access.
pub const LFU_PROBABILITY: f64 = 0.8;

/// Expired entries reclaimed per eviction are `expired / EXPIRED_BATCH_DIVISOR`, at least one.
pub const EXPIRED_BATCH_DIVISOR: usize = 10;

// == Eviction Policy ==
/// Victim selection rule for a single eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Lowest `access_count`, older `last_accessed_at` breaks ties
    LeastFrequentlyUsed,
    /// Oldest `last_accessed_at`
    LeastRecentlyUsed,
}

impl EvictionPolicy {
    // == Choose ==
    /// Draws the policy for one eviction.
    pub fn choose<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(LFU_PROBABILITY) {
            EvictionPolicy::LeastFrequentlyUsed
        } else {
            EvictionPolicy::LeastRecentlyUsed
        }
    }

    // == Select Victim ==
    /// Returns the key this policy would evict, or None if there are no entries.
    pub fn select_victim<V>(self, entries: &HashMap<String, CacheEntry<V>>) -> Option<String> {
        let victim = match self {
            EvictionPolicy::LeastFrequentlyUsed => entries.values().min_by(|a, b| {
                a.access_count
                    .cmp(&b.access_count)
                    .then(a.last_accessed_at.cmp(&b.last_accessed_at))
            }),
            EvictionPolicy::LeastRecentlyUsed => {
                entries.values().min_by_key(|entry| entry.last_accessed_at)
            }
        };
        victim.map(|entry| entry.key.clone())
    }
}

// == Expired Batch ==
/// Returns the expired keys to reclaim in one eviction.
///
/// Empty when nothing has expired, otherwise between one key and a tenth of
/// the expired set.
pub fn expired_batch<V>(entries: &HashMap<String, CacheEntry<V>>, now: Instant) -> Vec<String> {
    let expired: Vec<&String> = entries
        .iter()
        .filter(|(_, entry)| entry.is_expired_at(now))
        .map(|(key, _)| key)
        .collect();

    if expired.is_empty() {
        return Vec::new();
    }

    let batch = (expired.len() / EXPIRED_BATCH_DIVISOR).max(1);
    expired.into_iter().take(batch).cloned().collect()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::thread::sleep;
    use std::time::Duration;

    fn insert(entries: &mut HashMap<String, CacheEntry<u32>>, key: &str, ttl: Duration) {
        entries.insert(key.to_string(), CacheEntry::new(key, 0, ttl));
    }

    #[test]
    fn test_lfu_picks_lowest_access_count() {
        let mut entries = HashMap::new();
        insert(&mut entries, "hot", Duration::from_secs(60));
        insert(&mut entries, "cold", Duration::from_secs(60));
        insert(&mut entries, "warm", Duration::from_secs(60));

        for _ in 0..5 {
            entries.get_mut("hot").unwrap().access();
        }
        entries.get_mut("warm").unwrap().access();

        let victim = EvictionPolicy::LeastFrequentlyUsed.select_victim(&entries);
        assert_eq!(victim.as_deref(), Some("cold"));
    }

    #[test]
    fn test_lfu_ties_fall_back_to_recency() {
        let mut entries = HashMap::new();
        insert(&mut entries, "a", Duration::from_secs(60));
        sleep(Duration::from_millis(2));
        insert(&mut entries, "b", Duration::from_secs(60));

        let victim = EvictionPolicy::LeastFrequentlyUsed.select_victim(&entries);
        assert_eq!(victim.as_deref(), Some("a"));
    }

    #[test]
    fn test_lru_picks_oldest_access() {
        let mut entries = HashMap::new();
        insert(&mut entries, "a", Duration::from_secs(60));
        insert(&mut entries, "b", Duration::from_secs(60));

        // "b" is read a lot but long ago, "a" once but just now
        for _ in 0..10 {
            entries.get_mut("b").unwrap().access();
        }
        sleep(Duration::from_millis(2));
        entries.get_mut("a").unwrap().access();

        let victim = EvictionPolicy::LeastRecentlyUsed.select_victim(&entries);
        assert_eq!(victim.as_deref(), Some("b"));
    }

    #[test]
    fn test_select_victim_empty() {
        let entries: HashMap<String, CacheEntry<u32>> = HashMap::new();
        assert!(EvictionPolicy::LeastFrequentlyUsed
            .select_victim(&entries)
            .is_none());
        assert!(EvictionPolicy::LeastRecentlyUsed
            .select_victim(&entries)
            .is_none());
    }

    #[test]
    fn test_choose_is_biased_toward_lfu() {
        let mut rng = StdRng::seed_from_u64(7);
        let lfu = (0..10_000)
            .filter(|_| EvictionPolicy::choose(&mut rng) == EvictionPolicy::LeastFrequentlyUsed)
            .count();

        // 8000 expected
        assert!((7600..=8400).contains(&lfu), "lfu draws: {}", lfu);
    }

    #[test]
    fn test_expired_batch_empty_when_nothing_expired() {
        let mut entries = HashMap::new();
        insert(&mut entries, "a", Duration::from_secs(60));

        assert!(expired_batch(&entries, Instant::now()).is_empty());
    }

    #[test]
    fn test_expired_batch_takes_at_least_one() {
        let mut entries = HashMap::new();
        insert(&mut entries, "dead", Duration::ZERO);
        insert(&mut entries, "alive", Duration::from_secs(60));

        let batch = expired_batch(&entries, Instant::now());
        assert_eq!(batch, vec!["dead".to_string()]);
    }

    #[test]
    fn test_expired_batch_caps_at_a_tenth() {
        let mut entries = HashMap::new();
        for i in 0..35 {
            insert(&mut entries, &format!("dead{}", i), Duration::ZERO);
        }

        let batch = expired_batch(&entries, Instant::now());
        assert_eq!(batch.len(), 3);
        assert!(batch.iter().all(|key| key.starts_with("dead")));
    }
}

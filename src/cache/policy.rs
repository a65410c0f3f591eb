//! Eviction Policy Module
//!
//! Victim selection for LRU, LFU and TTL eviction.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::cache::{AccessOrder, CacheEntry};

// == Eviction Policy ==
/// Rule selecting which entry to remove when the cache is over budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Least recently used
    #[default]
    Lru,
    /// Least frequently used
    Lfu,
    /// Oldest creation time
    Ttl,
}

impl EvictionPolicy {
    /// Parses a policy name case-insensitively. Unknown names fall back to LRU.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "lfu" => EvictionPolicy::Lfu,
            "ttl" => EvictionPolicy::Ttl,
            _ => EvictionPolicy::Lru,
        }
    }

    /// Whether a successful lookup promotes the key in the access order.
    pub fn promotes_on_access(self) -> bool {
        self == EvictionPolicy::Lru
    }

    // == Select Victim ==
    /// Picks the key to evict without mutating anything.
    ///
    /// LFU and TTL scan in access order (oldest first) and keep the first
    /// minimum, so ties go to the earliest inserted key.
    pub fn select_victim(
        self,
        entries: &HashMap<String, CacheEntry>,
        order: &AccessOrder,
    ) -> Option<String> {
        match self {
            EvictionPolicy::Lru => order.peek_oldest().cloned(),
            EvictionPolicy::Lfu => order
                .iter_oldest_first()
                .filter_map(|key| entries.get(key).map(|e| (key, e.access_count)))
                .fold(None, keep_first_min)
                .map(|(key, _)| key.clone()),
            EvictionPolicy::Ttl => order
                .iter_oldest_first()
                .filter_map(|key| entries.get(key).map(|e| (key, e.created_at)))
                .fold(None, keep_first_min)
                .map(|(key, _)| key.clone()),
        }
    }
}

fn keep_first_min<K, V: Ord>(best: Option<(K, V)>, candidate: (K, V)) -> Option<(K, V)> {
    match best {
        Some(best) if best.1 <= candidate.1 => Some(best),
        _ => Some(candidate),
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvictionPolicy::Lru => "lru",
            EvictionPolicy::Lfu => "lfu",
            EvictionPolicy::Ttl => "ttl",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    fn fixture(rows: &[(&str, u64, u64)]) -> (HashMap<String, CacheEntry>, AccessOrder) {
        let base = Instant::now();
        let mut entries = HashMap::new();
        let mut order = AccessOrder::new();
        for (key, hits, age_secs) in rows {
            let mut entry = CacheEntry::new(key.to_string(), PathBuf::from(key), b"x", None);
            entry.access_count = *hits;
            entry.created_at = base + Duration::from_secs(100 - *age_secs);
            entries.insert(key.to_string(), entry);
            order.insert(key);
        }
        (entries, order)
    }

    #[test]
    fn test_from_name() {
        assert_eq!(EvictionPolicy::from_name("lru"), EvictionPolicy::Lru);
        assert_eq!(EvictionPolicy::from_name("LFU"), EvictionPolicy::Lfu);
        assert_eq!(EvictionPolicy::from_name(" ttl "), EvictionPolicy::Ttl);
        assert_eq!(EvictionPolicy::from_name("random"), EvictionPolicy::Lru);
        assert_eq!(EvictionPolicy::from_name(""), EvictionPolicy::Lru);
    }

    #[test]
    fn test_lru_picks_oldest_in_order() {
        let (entries, mut order) = fixture(&[("a", 0, 0), ("b", 0, 0), ("c", 0, 0)]);
        order.touch("a");
        assert_eq!(
            EvictionPolicy::Lru.select_victim(&entries, &order),
            Some("b".to_string())
        );
    }

    #[test]
    fn test_lfu_picks_min_access_count() {
        let (entries, order) = fixture(&[("a", 5, 0), ("b", 1, 0), ("c", 3, 0)]);
        assert_eq!(
            EvictionPolicy::Lfu.select_victim(&entries, &order),
            Some("b".to_string())
        );
    }

    #[test]
    fn test_lfu_tie_goes_to_first_inserted() {
        let (entries, order) = fixture(&[("a", 2, 0), ("b", 1, 0), ("c", 1, 0)]);
        assert_eq!(
            EvictionPolicy::Lfu.select_victim(&entries, &order),
            Some("b".to_string())
        );
    }

    #[test]
    fn test_ttl_picks_earliest_created() {
        let (entries, order) = fixture(&[("a", 0, 10), ("b", 0, 30), ("c", 0, 20)]);
        assert_eq!(
            EvictionPolicy::Ttl.select_victim(&entries, &order),
            Some("b".to_string())
        );
    }

    #[test]
    fn test_empty_has_no_victim() {
        let entries = HashMap::new();
        let order = AccessOrder::new();
        for policy in [EvictionPolicy::Lru, EvictionPolicy::Lfu, EvictionPolicy::Ttl] {
            assert_eq!(policy.select_victim(&entries, &order), None);
        }
    }
}

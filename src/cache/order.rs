//! Access Order Module
//!
//! Tracks key order for eviction: recency under LRU, insertion order otherwise.

use std::collections::VecDeque;

// == Access Order ==
/// Ordered set of cache keys.
///
/// Keys are stored in a VecDeque where:
/// - Front = Most recently inserted or touched
/// - Back = Least recently inserted or touched
///
/// Removal of an arbitrary key is O(n); popping the oldest is O(1).
#[derive(Debug, Default)]
pub struct AccessOrder {
    order: VecDeque<String>,
}

impl AccessOrder {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Insert ==
    /// Adds a key at the most recent position. Existing occurrences are dropped first.
    pub fn insert(&mut self, key: &str) {
        self.remove(key);
        self.order.push_front(key.to_string());
    }

    // == Touch ==
    /// Moves an existing key to the most recent position.
    ///
    /// Unknown keys are ignored so a touch can never grow the order past the map.
    pub fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_front(k);
            }
        }
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Peek Oldest ==
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.back()
    }

    /// Iterates keys from oldest to newest.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &String> {
        self.order.iter().rev()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_new() {
        let order = AccessOrder::new();
        assert!(order.is_empty());
        assert_eq!(order.len(), 0);
        assert_eq!(order.peek_oldest(), None);
    }

    #[test]
    fn test_insert_keeps_insertion_order() {
        let mut order = AccessOrder::new();

        order.insert("a");
        order.insert("b");
        order.insert("c");

        assert_eq!(order.len(), 3);
        let keys: Vec<&String> = order.iter_oldest_first().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reinsert_moves_to_newest() {
        let mut order = AccessOrder::new();

        order.insert("a");
        order.insert("b");
        order.insert("a");

        assert_eq!(order.len(), 2);
        assert_eq!(order.peek_oldest(), Some(&"b".to_string()));
    }

    #[test]
    fn test_touch_moves_to_front() {
        let mut order = AccessOrder::new();

        order.insert("a");
        order.insert("b");
        order.insert("c");

        order.touch("a");

        let oldest_first: Vec<&String> = order.iter_oldest_first().collect();
        assert_eq!(oldest_first, ["b", "c", "a"]);
    }

    #[test]
    fn test_touch_unknown_key_is_ignored() {
        let mut order = AccessOrder::new();
        order.insert("a");

        order.touch("ghost");

        assert_eq!(order.len(), 1);
        assert!(!order.contains("ghost"));
    }

    #[test]
    fn test_remove() {
        let mut order = AccessOrder::new();

        order.insert("key1");
        order.insert("key2");
        order.insert("key3");

        order.remove("key2");
        order.remove("nonexistent");

        assert_eq!(order.len(), 2);
        assert!(!order.contains("key2"));
        assert!(order.contains("key1"));
        assert!(order.contains("key3"));
    }

    #[test]
    fn test_clear() {
        let mut order = AccessOrder::new();
        order.insert("a");
        order.insert("b");
        order.clear();
        assert!(order.is_empty());
    }
}

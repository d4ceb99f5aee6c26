//! LRU Order Module
//!
//! Recency bookkeeping for the in-memory backing store's capacity eviction.

use std::collections::{BTreeMap, HashMap};

// == LRU Order ==
/// Tracks record keys by last access.
///
/// Each touch stamps the key with a fresh tick; the smallest tick is the
/// least recently used key.
#[derive(Debug, Default)]
pub struct LruOrder {
    /// Next tick to hand out
    clock: u64,
    /// Key -> tick of last access
    ticks: HashMap<String, u64>,
    /// Tick -> key, ordered oldest first
    order: BTreeMap<u64, String>,
}

impl LruOrder {
    // == Constructor ==
    /// Creates an empty order.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used.
    pub fn touch(&mut self, key: &str) {
        let tick = self.clock;
        self.clock += 1;

        if let Some(previous) = self.ticks.insert(key.to_string(), tick) {
            self.order.remove(&previous);
        }
        self.order.insert(tick, key.to_string());
    }

    // == Remove ==
    /// Forgets a key. Unknown keys are ignored.
    pub fn remove(&mut self, key: &str) {
        if let Some(tick) = self.ticks.remove(key) {
            self.order.remove(&tick);
        }
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    /// Returns the least recently used key without removing it.
    #[cfg(test)]
    pub fn peek_oldest(&self) -> Option<&str> {
        self.order.values().next().map(String::as_str)
    }

    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_new() {
        let lru = LruOrder::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
    }

    #[test]
    fn test_touch_existing_key_moves_it_last() {
        let mut lru = LruOrder::new();
        lru.touch("query:a");
        lru.touch("query:b");
        lru.touch("query:c");

        lru.touch("query:a");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some("query:b"));
    }

    #[test]
    fn test_evict_order() {
        let mut lru = LruOrder::new();
        lru.touch("a");
        lru.touch("b");
        lru.touch("c");
        lru.touch("a");
        lru.touch("c");
        lru.touch("b");

        assert_eq!(lru.evict_oldest(), Some("a".to_string()));
        assert_eq!(lru.evict_oldest(), Some("c".to_string()));
        assert_eq!(lru.evict_oldest(), Some("b".to_string()));
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_remove() {
        let mut lru = LruOrder::new();
        lru.touch("a");
        lru.touch("b");

        lru.remove("a");
        lru.remove("missing");

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.peek_oldest(), Some("b"));
    }

    #[test]
    fn test_repeated_touch_keeps_one_slot() {
        let mut lru = LruOrder::new();
        lru.touch("a");
        lru.touch("a");
        lru.touch("a");

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.evict_oldest(), Some("a".to_string()));
        assert!(lru.is_empty());
    }
}

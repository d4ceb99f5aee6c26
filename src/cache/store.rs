//! Hash Store Module
//!
//! In-memory record storage: one field map per key, with per-record TTL and
//! LRU eviction at capacity. Plays the part of a Redis hash keyspace.

use std::collections::HashMap;

use crate::cache::record::Fields;
use crate::cache::{LruOrder, StoreStats, StoredEntry, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::{CacheError, Result};

// == Hash Store ==
/// Field-map storage with LRU eviction and TTL support.
#[derive(Debug)]
pub struct HashStore {
    /// Key -> record
    entries: HashMap<String, StoredEntry>,
    /// LRU access order
    lru: LruOrder,
    /// Store counters
    stats: StoreStats,
    /// Maximum number of records allowed
    max_entries: usize,
    /// TTL in seconds applied to every record, 0 = no expiry
    default_ttl: u64,
}

impl HashStore {
    // == Constructor ==
    /// Creates a new HashStore with specified capacity and TTL.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of records the store can hold
    /// * `default_ttl` - TTL in seconds for every record, 0 disables expiry
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruOrder::new(),
            stats: StoreStats::new(),
            max_entries,
            default_ttl,
        }
    }

    // == Replace ==
    /// Stores `fields` under `key`, dropping every field of any prior record.
    ///
    /// If the store is at capacity, the least recently used record is evicted.
    pub fn replace(&mut self, key: String, fields: Fields) -> Result<()> {
        if key.is_empty() || key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key must be 1..={} bytes",
                MAX_KEY_LENGTH
            )));
        }

        let entry = StoredEntry::new(fields, (self.default_ttl > 0).then_some(self.default_ttl));
        if entry.size_bytes() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Record exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        let is_overwrite = self.entries.contains_key(&key);
        if !is_overwrite && self.entries.len() >= self.max_entries {
            match self.lru.evict_oldest() {
                Some(evicted_key) => {
                    self.entries.remove(&evicted_key);
                    self.stats.record_eviction();
                }
                None => {
                    return Err(CacheError::Internal(
                        "Store is full and eviction failed".to_string(),
                    ));
                }
            }
        }

        self.entries.insert(key.clone(), entry);
        self.lru.touch(&key);
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Fetch ==
    /// Returns all fields of the record under `key`.
    ///
    /// Expired records are removed and reported as absent.
    pub fn fetch(&mut self, key: &str) -> Option<Fields> {
        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(),
        };

        if expired {
            self.drop_key(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.fields.clone())
    }

    // == Remove ==
    /// Removes the record under `key`. Returns whether one existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.drop_key(key)
    }

    /// Removes the record under `key` only if its fields equal `expected`.
    pub fn remove_if(&mut self, key: &str, expected: &Fields) -> bool {
        match self.entries.get(key) {
            Some(entry) if entry.fields == *expected => self.drop_key(key),
            _ => false,
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired records and returns how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.record_expirations(expired_keys.len());
        self.stats.set_total_entries(self.entries.len());
        expired_keys.len()
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> StoreStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the current number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn drop_key(&mut self, key: &str) -> bool {
        let existed = self.entries.remove(key).is_some();
        if existed {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        existed
    }
}

//! Backing Store Module
//!
//! The key-value store the dependency cache persists records into.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::record::Fields;
use crate::cache::{HashStore, StoreStats};
use crate::error::Result;

// == Backend Trait ==
/// Structured per-key record storage.
///
/// Implementations must write and read a record's fields atomically and be
/// safe to share across concurrent computations. Eviction and TTL are
/// the implementation's own business.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Returns every field of the record under `key`, or None if absent.
    async fn fetch(&self, key: &str) -> Result<Option<Fields>>;

    /// Replaces the record under `key` with exactly `fields`.
    async fn replace(&self, key: &str, fields: Fields) -> Result<()>;

    /// Removes the record under `key`. Returns whether one existed.
    async fn remove(&self, key: &str) -> Result<bool>;

    /// Removes the record under `key` only while its fields still equal
    /// `expected`, as one atomic step. Returns whether it was removed.
    async fn remove_if(&self, key: &str, expected: &Fields) -> Result<bool>;

    /// Returns store statistics, if the implementation keeps any.
    async fn stats(&self) -> Option<StoreStats> {
        None
    }
}

// == Memory Backend ==
/// [`KvBackend`] over an in-process [`HashStore`].
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    store: Arc<RwLock<HashStore>>,
}

impl MemoryBackend {
    /// Creates a backend holding at most `max_entries` records, each living
    /// `default_ttl` seconds (0 = forever).
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashStore::new(max_entries, default_ttl))),
        }
    }

    /// Shared handle to the underlying store, for the cleanup task.
    pub fn shared(&self) -> Arc<RwLock<HashStore>> {
        self.store.clone()
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn fetch(&self, key: &str) -> Result<Option<Fields>> {
        // Write lock: reads update LRU order and stats
        Ok(self.store.write().await.fetch(key))
    }

    async fn replace(&self, key: &str, fields: Fields) -> Result<()> {
        self.store.write().await.replace(key.to_string(), fields)
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.store.write().await.remove(key))
    }

    async fn remove_if(&self, key: &str, expected: &Fields) -> Result<bool> {
        Ok(self.store.write().await.remove_if(key, expected))
    }

    async fn stats(&self) -> Option<StoreStats> {
        Some(self.store.read().await.stats())
    }
}

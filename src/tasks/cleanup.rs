//! TTL Cleanup Task
//!
//! Background task that periodically drops expired records from the
//! in-memory backing store. Independent of staleness: a record can be
//! fresh by version and still expire here, or stale and still present.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::HashStore;

/// Spawns a background task that periodically removes expired records.
///
/// # Arguments
/// * `store` - Shared handle from [`MemoryBackend::shared`](crate::cache::MemoryBackend::shared)
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle the caller aborts during graceful shutdown.
pub fn spawn_cleanup_task(
    store: Arc<RwLock<HashStore>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.write().await.cleanup_expired();

            if removed > 0 {
                info!("TTL cleanup: removed {} expired records", removed);
            } else {
                debug!("TTL cleanup: no expired records found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Fields, PAYLOAD_FIELD};

    fn record() -> Fields {
        let mut fields = Fields::new();
        fields.insert(PAYLOAD_FIELD.to_string(), "value".to_string());
        fields
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_records() {
        let store = Arc::new(RwLock::new(HashStore::new(100, 1)));
        store
            .write()
            .await
            .replace("expire_soon".to_string(), record())
            .unwrap();

        let handle = spawn_cleanup_task(store.clone(), 1);

        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert!(store.read().await.is_empty(), "Expired record should be swept");
        assert_eq!(store.read().await.stats().expirations, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_live_records() {
        let store = Arc::new(RwLock::new(HashStore::new(100, 3600)));
        store
            .write()
            .await
            .replace("long_lived".to_string(), record())
            .unwrap();

        let handle = spawn_cleanup_task(store.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(store.read().await.len(), 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let store = Arc::new(RwLock::new(HashStore::new(100, 300)));

        let handle = spawn_cleanup_task(store, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}

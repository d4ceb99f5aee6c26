//! Dependency Cache Module
//!
//! Get/set/delete over a [`KvBackend`], where every record carries the
//! versions of the constraints its payload was computed from. A read is a hit
//! only while none of those constraints has moved past the stored version.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::backend::KvBackend;
use crate::cache::record::{CacheRecord, DependencySnapshot, Fields};
use crate::cache::stats::{CacheCounters, CacheStats};
use crate::cache::tracker::ExecutionTracker;
use crate::cache::versions::ConstraintVersionStore;
use crate::error::{CacheError, Result};

/// Default upper bound on one backing-store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(250);

// == Lookup Outcome ==
/// Why a read produced no payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    /// No record under the key
    Absent,
    /// The record could not be decoded
    Malformed,
    /// A dependency advanced past the version stored with the record
    Stale {
        constraint: String,
        stored: u64,
        current: u64,
    },
    /// The backing store failed or timed out
    Unavailable,
}

/// Result of [`DependencyCache::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Hit(String),
    Miss(MissReason),
}

impl Lookup {
    /// The payload on a hit.
    pub fn into_payload(self) -> Option<String> {
        match self {
            Lookup::Hit(payload) => Some(payload),
            Lookup::Miss(_) => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }
}

// == Dependency Cache ==
/// Version-checked response cache.
///
/// Cheap to clone; clones share the backend, the version store and the
/// counters. No operation returns an error to the response path: store
/// trouble degrades reads to misses and writes to logged no-ops.
#[derive(Clone)]
pub struct DependencyCache {
    backend: Arc<dyn KvBackend>,
    versions: Arc<ConstraintVersionStore>,
    counters: Arc<CacheCounters>,
    store_timeout: Duration,
    evict_on_stale: bool,
}

impl DependencyCache {
    // == Constructor ==
    /// Creates a cache over `backend`, checking freshness against `versions`.
    pub fn new(backend: Arc<dyn KvBackend>, versions: Arc<ConstraintVersionStore>) -> Self {
        Self {
            backend,
            versions,
            counters: Arc::new(CacheCounters::default()),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            evict_on_stale: false,
        }
    }

    /// Sets the upper bound on each backing-store call.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Deletes records in the background as soon as a read finds them stale.
    pub fn with_evict_on_stale(mut self, enabled: bool) -> Self {
        self.evict_on_stale = enabled;
        self
    }

    // == Get ==
    /// Returns the cached payload for `key` if present and fresh.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.lookup(key).await.into_payload()
    }

    // == Lookup ==
    /// Like [`get`](Self::get), but reports why a read missed.
    pub async fn lookup(&self, key: &str) -> Lookup {
        let fields = match bounded(self.store_timeout, self.backend.fetch(key)).await {
            Ok(Some(fields)) => fields,
            Ok(None) => {
                debug!("cache get {} -> not found", key);
                return self.miss(MissReason::Absent);
            }
            Err(err) => {
                warn!("cache get {} degraded to miss: {}", key, err);
                self.counters.store_error();
                return self.miss(MissReason::Unavailable);
            }
        };

        let observed = self.evict_on_stale.then(|| fields.clone());
        let record = match CacheRecord::from_fields(fields) {
            Ok(record) => record,
            Err(err) => {
                warn!("cache get {} -> {}", key, err);
                self.counters.malformed();
                return self.miss(MissReason::Malformed);
            }
        };

        if let Some(reason) = self.find_stale(&record.dependencies) {
            debug!("cache get {} -> expired ({:?})", key, reason);
            self.counters.stale();
            if let Some(observed) = observed {
                self.spawn_eviction(key, observed);
            }
            return self.miss(reason);
        }

        debug!(
            "cache get {} -> found ({} dependencies)",
            key,
            record.dependencies.len()
        );
        self.counters.hit();
        Lookup::Hit(record.payload)
    }

    // == Set ==
    /// Caches `payload` under `key` with the dependencies `tracker` recorded.
    ///
    /// The snapshot is taken immediately, which closes the tracker's window;
    /// persistence runs in the background. The returned handle resolves to
    /// whether the write succeeded and may be dropped. Returns None when the
    /// tracker had no open window or no Tokio runtime is running, in which
    /// case nothing is cached.
    pub fn set(
        &self,
        key: impl Into<String>,
        payload: impl Into<String>,
        tracker: &ExecutionTracker,
    ) -> Option<JoinHandle<bool>> {
        let key = key.into();
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                warn!("cache set {} skipped: {}", key, err);
                return None;
            }
        };
        let snapshot = match tracker.snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("cache set {} skipped: {}", key, err);
                return None;
            }
        };

        let record = CacheRecord::new(payload, snapshot);
        let cache = self.clone();
        Some(runtime.spawn(async move {
            match cache.store(&key, &record).await {
                Ok(()) => true,
                Err(err) => {
                    warn!("cache set {} abandoned: {}", key, err);
                    false
                }
            }
        }))
    }

    // == Store ==
    /// Persists `record` under `key`, replacing any prior record.
    ///
    /// This is the awaited write path behind [`set`](Self::set).
    pub async fn store(&self, key: &str, record: &CacheRecord) -> Result<()> {
        let fields = record.to_fields();
        match bounded(self.store_timeout, self.backend.replace(key, fields)).await {
            Ok(()) => {
                debug!(
                    "cache set {} with dependencies {:?}",
                    key, record.dependencies
                );
                self.counters.write();
                Ok(())
            }
            Err(err) => {
                self.counters.store_error();
                Err(err)
            }
        }
    }

    // == Delete ==
    /// Removes the record under `key` without any freshness check.
    ///
    /// Absent keys are fine. Returns whether a record was actually removed;
    /// store failures are logged and reported as false.
    pub async fn delete(&self, key: &str) -> bool {
        self.counters.delete();
        match bounded(self.store_timeout, self.backend.remove(key)).await {
            Ok(removed) => {
                debug!("cache delete {} (existed: {})", key, removed);
                removed
            }
            Err(err) => {
                warn!("cache delete {} failed: {}", key, err);
                self.counters.store_error();
                false
            }
        }
    }

    // == Evict ==
    /// Removes a stale record in the background, unless it was rewritten
    /// since `observed` was read.
    fn spawn_eviction(&self, key: &str, observed: Fields) {
        let Ok(runtime) = Handle::try_current() else {
            debug!("cache evict {} skipped: no runtime", key);
            return;
        };
        let cache = self.clone();
        let key = key.to_string();
        runtime.spawn(async move {
            cache.evict_if_unchanged(&key, &observed).await;
        });
    }

    async fn evict_if_unchanged(&self, key: &str, observed: &Fields) -> bool {
        match bounded(self.store_timeout, self.backend.remove_if(key, observed)).await {
            Ok(removed) => {
                if removed {
                    self.counters.eviction();
                }
                debug!("cache evict {} (removed: {})", key, removed);
                removed
            }
            Err(err) => {
                warn!("cache evict {} failed: {}", key, err);
                self.counters.store_error();
                false
            }
        }
    }

    // == Accessors ==
    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    /// The version store freshness is checked against.
    pub fn versions(&self) -> &Arc<ConstraintVersionStore> {
        &self.versions
    }

    /// The backing store.
    pub fn backend(&self) -> &Arc<dyn KvBackend> {
        &self.backend
    }

    fn find_stale(&self, dependencies: &DependencySnapshot) -> Option<MissReason> {
        dependencies.iter().find_map(|(constraint, stored)| {
            let current = self.versions.get(constraint);
            (current > stored).then(|| MissReason::Stale {
                constraint: constraint.to_string(),
                stored,
                current,
            })
        })
    }

    fn miss(&self, reason: MissReason) -> Lookup {
        self.counters.miss();
        Lookup::Miss(reason)
    }
}

/// Runs a backing-store call with a deadline; timeouts become
/// `StoreUnavailable`.
async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(CacheError::StoreUnavailable(format!(
            "no response within {:?}",
            timeout
        ))),
    }
}

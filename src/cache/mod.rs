//! Cache Module
//!
//! Dependency-tagged response caching: constraint versions, per-computation
//! trackers, the version-checked cache itself, and the in-memory backing
//! store it writes to.

mod backend;
mod dependency;
mod entry;
mod lifecycle;
mod lru;
mod record;
mod stats;
mod store;
mod tracked;
mod tracker;
mod versions;


// Re-export public types
pub use backend::{KvBackend, MemoryBackend};
pub use dependency::{DependencyCache, Lookup, MissReason, DEFAULT_STORE_TIMEOUT};
pub use entry::StoredEntry;
pub use lifecycle::RequestLifecycle;
pub use lru::LruOrder;
pub use record::{CacheRecord, DependencySnapshot, Fields, PAYLOAD_FIELD};
pub use stats::{CacheStats, StoreStats};
pub use store::HashStore;
pub use tracked::Tracked;
pub use tracker::ExecutionTracker;
pub use versions::{Advance, ConstraintVersionStore, UNSEEN_VERSION};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed record size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

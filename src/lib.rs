//! Dep Cache - A dependency-tagged response cache
//!
//! Cached payloads carry the versions of the data partitions they were
//! computed from and are served only while none of those has moved on.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{DependencyCache, ExecutionTracker, RequestLifecycle};
pub use config::Config;
pub use tasks::spawn_cleanup_task;

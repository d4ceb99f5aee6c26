//! Background Tasks Module
//!
//! # Tasks
//! - TTL Cleanup: Removes expired records from the in-memory backing store

mod cleanup;

pub use cleanup::spawn_cleanup_task;

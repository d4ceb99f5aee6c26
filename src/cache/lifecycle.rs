//! Request Lifecycle Module
//!
//! The single point where a computation's dependency tracking starts.

use std::sync::Arc;

use tracing::trace;

use crate::cache::tracker::ExecutionTracker;
use crate::cache::versions::ConstraintVersionStore;

// == Request Lifecycle ==
/// Hands out one tracker per computation.
///
/// The execution host calls [`begin`](Self::begin) right before a
/// computation starts gathering data, or
/// [`on_computation_start`](Self::on_computation_start) when it already owns
/// a tracker for that computation.
#[derive(Debug, Clone)]
pub struct RequestLifecycle {
    versions: Arc<ConstraintVersionStore>,
}

impl RequestLifecycle {
    /// Creates a lifecycle whose trackers resolve against `versions`.
    pub fn new(versions: Arc<ConstraintVersionStore>) -> Self {
        Self { versions }
    }

    /// Allocates a fresh tracker with an open tracking window.
    pub fn begin(&self) -> ExecutionTracker {
        let tracker = ExecutionTracker::new(self.versions.clone());
        self.on_computation_start(&tracker);
        tracker
    }

    /// Resets `tracker` for a new computation. No other state changes.
    pub fn on_computation_start(&self, tracker: &ExecutionTracker) {
        trace!("Computation started, tracker reset");
        tracker.reset();
    }
}

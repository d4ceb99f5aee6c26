//! Tracked Access Module
//!
//! Wraps a data partition so that reading it records its constraint.

use crate::cache::tracker::ExecutionTracker;

// == Tracked ==
/// A data partition guarded by a constraint name.
///
/// The inner value is only reachable through [`Tracked::read`], which
/// records the constraint into the caller's tracker first. New access points
/// therefore cannot forget to declare their dependency.
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    constraint: String,
    inner: T,
}

impl<T> Tracked<T> {
    /// Guards `inner` with `constraint`.
    pub fn new(constraint: impl Into<String>, inner: T) -> Self {
        Self {
            constraint: constraint.into(),
            inner,
        }
    }

    /// Records the constraint in `tracker` and returns the partition.
    pub fn read(&self, tracker: &ExecutionTracker) -> &T {
        tracker.record(&self.constraint);
        &self.inner
    }

    /// Name of the constraint guarding this partition.
    pub fn constraint(&self) -> &str {
        &self.constraint
    }
}

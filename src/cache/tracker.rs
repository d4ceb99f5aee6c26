//! Execution Tracker Module
//!
//! Accumulates the constraints one computation touches so the resulting
//! payload can be stored with exactly those dependencies.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use crate::cache::record::{DependencySnapshot, PAYLOAD_FIELD};
use crate::cache::versions::ConstraintVersionStore;
use crate::error::{CacheError, Result};

// == Tracker State ==
#[derive(Debug, Default)]
enum TrackerState {
    /// No computation started yet
    #[default]
    Idle,
    /// Between `reset` and `snapshot`
    Tracking(HashSet<String>),
    /// The window was consumed by `snapshot`
    Snapshotted,
}

// == Execution Tracker ==
/// Per-computation dependency accumulator.
///
/// Clones share state, so the resolvers of one computation can each hold a
/// handle. Separate computations must use separate trackers; see
/// [`RequestLifecycle::begin`](crate::cache::RequestLifecycle::begin).
#[derive(Debug, Clone)]
pub struct ExecutionTracker {
    state: Arc<Mutex<TrackerState>>,
    versions: Arc<ConstraintVersionStore>,
}

impl ExecutionTracker {
    // == Constructor ==
    /// Creates an idle tracker that resolves versions against `versions`.
    pub fn new(versions: Arc<ConstraintVersionStore>) -> Self {
        Self {
            state: Arc::new(Mutex::new(TrackerState::Idle)),
            versions,
        }
    }

    // == Reset ==
    /// Clears anything recorded and opens a new tracking window.
    pub fn reset(&self) {
        *self.lock() = TrackerState::Tracking(HashSet::new());
    }

    // == Record ==
    /// Marks `constraint` as consulted by the current computation.
    ///
    /// Recording the same name twice has no further effect. Returns false
    /// (and logs) when no tracking window is open or the name collides with
    /// the payload field.
    pub fn record(&self, constraint: &str) -> bool {
        if constraint == PAYLOAD_FIELD {
            warn!(
                "Constraint name '{}' is reserved for the payload field; not recorded",
                constraint
            );
            return false;
        }

        match &mut *self.lock() {
            TrackerState::Tracking(touched) => {
                if !touched.contains(constraint) {
                    touched.insert(constraint.to_string());
                }
                true
            }
            TrackerState::Idle => {
                warn!("record('{}') called before reset; ignored", constraint);
                false
            }
            TrackerState::Snapshotted => {
                warn!("record('{}') called after snapshot; ignored", constraint);
                false
            }
        }
    }

    // == Snapshot ==
    /// Resolves every recorded constraint to its current version and closes
    /// the tracking window.
    ///
    /// # Errors
    /// `CallerMisuse` if called before `reset` or twice for one window.
    pub fn snapshot(&self) -> Result<DependencySnapshot> {
        let touched = {
            let mut state = self.lock();
            match std::mem::replace(&mut *state, TrackerState::Snapshotted) {
                TrackerState::Tracking(touched) => touched,
                TrackerState::Idle => {
                    *state = TrackerState::Idle;
                    return Err(CacheError::CallerMisuse(
                        "snapshot called before reset".to_string(),
                    ));
                }
                TrackerState::Snapshotted => {
                    return Err(CacheError::CallerMisuse(
                        "snapshot called twice for one computation".to_string(),
                    ));
                }
            }
        };

        Ok(touched
            .into_iter()
            .map(|name| {
                let version = self.versions.get(&name);
                (name, version)
            })
            .collect())
    }

    // == Inspection ==
    /// Returns the constraints recorded in the open window, sorted.
    pub fn recorded(&self) -> Vec<String> {
        match &*self.lock() {
            TrackerState::Tracking(touched) => {
                let mut names: Vec<String> = touched.iter().cloned().collect();
                names.sort();
                names
            }
            _ => Vec::new(),
        }
    }

    /// Returns true between `reset` and `snapshot`.
    pub fn is_tracking(&self) -> bool {
        matches!(&*self.lock(), TrackerState::Tracking(_))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_with(seed: &[(&str, u64)]) -> ExecutionTracker {
        let versions = ConstraintVersionStore::seeded(seed.iter().map(|(n, v)| (*n, *v)));
        ExecutionTracker::new(Arc::new(versions))
    }

    #[test]
    fn test_snapshot_resolves_current_versions() {
        let tracker = tracker_with(&[("books", 1), ("authors", 5)]);
        tracker.reset();
        tracker.record("books");
        tracker.record("languages");

        let snapshot = tracker.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("books"), Some(1));
        assert_eq!(snapshot.get("languages"), Some(0));
        assert_eq!(snapshot.get("authors"), None);
    }

    #[test]
    fn test_record_is_idempotent() {
        let once = tracker_with(&[("books", 4)]);
        once.reset();
        once.record("books");

        let twice = tracker_with(&[("books", 4)]);
        twice.reset();
        twice.record("books");
        twice.record("books");

        assert_eq!(once.snapshot().unwrap(), twice.snapshot().unwrap());
    }

    #[test]
    fn test_reset_clears_previous_window() {
        let tracker = tracker_with(&[]);
        tracker.reset();
        tracker.record("books");
        tracker.reset();
        tracker.record("authors");

        assert_eq!(tracker.recorded(), vec!["authors".to_string()]);
    }

    #[test]
    fn test_record_before_reset_is_ignored() {
        let tracker = tracker_with(&[]);
        assert!(!tracker.record("books"));

        tracker.reset();
        assert!(tracker.snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_record_after_snapshot_is_ignored() {
        let tracker = tracker_with(&[]);
        tracker.reset();
        tracker.snapshot().unwrap();

        assert!(!tracker.record("books"));
        assert!(!tracker.is_tracking());
    }

    #[test]
    fn test_snapshot_twice_is_misuse() {
        let tracker = tracker_with(&[]);
        tracker.reset();
        tracker.snapshot().unwrap();

        assert!(matches!(
            tracker.snapshot(),
            Err(CacheError::CallerMisuse(_))
        ));
    }

    #[test]
    fn test_snapshot_before_reset_is_misuse() {
        let tracker = tracker_with(&[]);
        assert!(matches!(
            tracker.snapshot(),
            Err(CacheError::CallerMisuse(_))
        ));
        // Still usable afterwards
        tracker.reset();
        assert!(tracker.snapshot().is_ok());
    }

    #[test]
    fn test_payload_field_name_is_rejected() {
        let tracker = tracker_with(&[]);
        tracker.reset();
        assert!(!tracker.record(PAYLOAD_FIELD));
        assert!(tracker.recorded().is_empty());
    }

    #[test]
    fn test_clones_share_one_window() {
        let tracker = tracker_with(&[]);
        tracker.reset();
        let handle = tracker.clone();
        handle.record("stores");

        assert_eq!(tracker.recorded(), vec!["stores".to_string()]);
    }
}

//! Constraint Version Module
//!
//! Process-wide map from constraint name to the latest known version.
//! Only the change feed writes to it; everything else reads.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

/// Version assumed for a constraint the feed has never reported.
pub const UNSEEN_VERSION: u64 = 0;

// == Advance Outcome ==
/// Result of feeding a version into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The version moved forward
    Applied { previous: u64, current: u64 },
    /// The version equals the one already known
    Unchanged,
    /// The version is older than the one already known and was dropped
    Ignored { current: u64 },
}

// == Constraint Version Store ==
/// Latest known version per constraint.
///
/// Versions never decrease. Each `advance` replaces a single map slot under
/// the write lock, so readers see either the old or the new value.
#[derive(Debug, Default)]
pub struct ConstraintVersionStore {
    versions: RwLock<HashMap<String, u64>>,
}

impl ConstraintVersionStore {
    // == Constructor ==
    /// Creates an empty store where every constraint is at version 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with known versions.
    ///
    /// Duplicate names keep the highest version.
    pub fn seeded<I, S>(seed: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let store = Self::new();
        for (name, version) in seed {
            store.advance(name, version);
        }
        store
    }

    // == Get ==
    /// Returns the current version of `name`, or 0 if it was never advanced.
    pub fn get(&self, name: &str) -> u64 {
        self.versions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
            .unwrap_or(UNSEEN_VERSION)
    }

    // == Advance ==
    /// Moves `name` forward to `version`.
    ///
    /// Called by the change feed. Older versions are dropped so the
    /// observed version never goes backwards.
    pub fn advance(&self, name: impl Into<String>, version: u64) -> Advance {
        let name = name.into();
        let mut versions = self
            .versions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let slot = versions.entry(name.clone()).or_insert(UNSEEN_VERSION);
        let previous = *slot;

        if version > previous {
            *slot = version;
            debug!("Constraint {} advanced {} -> {}", name, previous, version);
            Advance::Applied {
                previous,
                current: version,
            }
        } else if version == previous {
            Advance::Unchanged
        } else {
            warn!(
                "Ignoring out-of-order version {} for {} (current {})",
                version, name, previous
            );
            Advance::Ignored { current: previous }
        }
    }

    // == Bump ==
    /// Advances `name` by one and returns the new version.
    pub fn bump(&self, name: impl Into<String>) -> u64 {
        let name = name.into();
        let mut versions = self
            .versions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let slot = versions.entry(name).or_insert(UNSEEN_VERSION);
        *slot = slot.saturating_add(1);
        *slot
    }

    // == All ==
    /// Returns every known constraint with its version, sorted by name.
    pub fn all(&self) -> Vec<(String, u64)> {
        let mut all: Vec<(String, u64)> = self
            .versions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, version)| (name.clone(), *version))
            .collect();
        all.sort();
        all
    }

    /// Returns the number of constraints the feed has reported.
    pub fn len(&self) -> usize {
        self.versions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no constraint was ever reported.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

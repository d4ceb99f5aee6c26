//! Cache Record Module
//!
//! Structured form of what the dependency cache persists: a payload plus the
//! versions of every constraint the payload was computed from.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Field holding the payload inside a stored record.
pub const PAYLOAD_FIELD: &str = "data";

/// Flat field map as exchanged with the backing store.
pub type Fields = HashMap<String, String>;

// == Dependency Snapshot ==
/// Constraint versions captured when a payload was written.
///
/// Backed by a BTreeMap so iteration and serialization order are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencySnapshot(BTreeMap<String, u64>);

impl DependencySnapshot {
    /// Creates an empty snapshot (a payload that depends on nothing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one dependency.
    pub fn insert(&mut self, constraint: impl Into<String>, version: u64) {
        self.0.insert(constraint.into(), version);
    }

    /// Returns the stored version of `constraint`, if it is a dependency.
    pub fn get(&self, constraint: &str) -> Option<u64> {
        self.0.get(constraint).copied()
    }

    /// Iterates dependencies in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(name, version)| (name.as_str(), *version))
    }

    /// Returns the number of dependencies.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the payload depends on no constraint.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for DependencySnapshot {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// == Cache Record ==
/// A payload together with its dependency snapshot.
///
/// Records are immutable once built; writing a key again replaces the
/// whole record, dependency fields included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    /// Opaque response payload
    pub payload: String,
    /// Constraint versions the payload was computed from
    pub dependencies: DependencySnapshot,
}

impl CacheRecord {
    // == Constructor ==
    /// Creates a record from a payload and its snapshot.
    pub fn new(payload: impl Into<String>, dependencies: DependencySnapshot) -> Self {
        Self {
            payload: payload.into(),
            dependencies,
        }
    }

    // == Encode ==
    /// Flattens the record into store fields: one payload field plus one
    /// field per dependency holding the decimal version.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::with_capacity(self.dependencies.len() + 1);
        fields.insert(PAYLOAD_FIELD.to_string(), self.payload.clone());
        for (constraint, version) in self.dependencies.iter() {
            fields.insert(constraint.to_string(), version.to_string());
        }
        fields
    }

    // == Decode ==
    /// Rebuilds a record from store fields.
    ///
    /// # Errors
    /// `MalformedEntry` if the payload field is missing or a dependency
    /// value is not an unsigned integer.
    pub fn from_fields(mut fields: Fields) -> Result<Self> {
        let payload = fields.remove(PAYLOAD_FIELD).ok_or_else(|| {
            CacheError::MalformedEntry(format!("missing '{}' field", PAYLOAD_FIELD))
        })?;

        let mut dependencies = DependencySnapshot::new();
        for (constraint, raw) in fields {
            let version = raw.parse::<u64>().map_err(|_| {
                CacheError::MalformedEntry(format!(
                    "version '{}' for '{}' is not an unsigned integer",
                    raw, constraint
                ))
            })?;
            dependencies.insert(constraint, version);
        }

        Ok(Self {
            payload,
            dependencies,
        })
    }
}

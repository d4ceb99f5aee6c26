//! Response DTOs for the HTTP adapter
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{Advance, CacheStats, Lookup, MissReason, StoreStats};

/// Response body for POST /feed/advance
#[derive(Debug, Clone, Serialize)]
pub struct AdvanceResponse {
    pub constraint: String,
    /// `applied`, `unchanged` or `ignored`
    pub outcome: &'static str,
    /// Version in effect after the call
    pub version: u64,
}

impl AdvanceResponse {
    pub fn new(constraint: impl Into<String>, advance: Advance, requested: u64) -> Self {
        let (outcome, version) = match advance {
            Advance::Applied { current, .. } => ("applied", current),
            Advance::Unchanged => ("unchanged", requested),
            Advance::Ignored { current } => ("ignored", current),
        };
        Self {
            constraint: constraint.into(),
            outcome,
            version,
        }
    }
}

/// Response body for GET /versions/:constraint
#[derive(Debug, Clone, Serialize)]
pub struct VersionResponse {
    pub constraint: String,
    pub version: u64,
}

impl VersionResponse {
    pub fn new(constraint: impl Into<String>, version: u64) -> Self {
        Self {
            constraint: constraint.into(),
            version,
        }
    }
}

/// Response body for GET /versions
#[derive(Debug, Clone, Serialize)]
pub struct VersionsResponse {
    pub versions: Vec<VersionResponse>,
}

impl VersionsResponse {
    pub fn new(all: Vec<(String, u64)>) -> Self {
        Self {
            versions: all
                .into_iter()
                .map(|(constraint, version)| VersionResponse::new(constraint, version))
                .collect(),
        }
    }
}

/// Response body for GET /cache/:key
///
/// `payload` is set on a hit; `reason` (and for stale reads `constraint`)
/// on a miss.
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    pub key: String,
    pub hit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
}

impl LookupResponse {
    pub fn new(key: impl Into<String>, lookup: Lookup) -> Self {
        let key = key.into();
        match lookup {
            Lookup::Hit(payload) => Self {
                key,
                hit: true,
                payload: Some(payload),
                reason: None,
                constraint: None,
            },
            Lookup::Miss(reason) => {
                let (reason, constraint) = match reason {
                    MissReason::Absent => ("absent", None),
                    MissReason::Malformed => ("malformed", None),
                    MissReason::Stale { constraint, .. } => ("stale", Some(constraint)),
                    MissReason::Unavailable => ("unavailable", None),
                };
                Self {
                    key,
                    hit: false,
                    payload: None,
                    reason: Some(reason),
                    constraint,
                }
            }
        }
    }
}

/// Response body for DELETE /cache/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
    /// Whether a record existed
    pub removed: bool,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>, removed: bool) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted", key),
            key,
            removed,
        }
    }
}

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache: CacheStats,
    pub hit_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreStats>,
    /// Number of constraints the feed has reported
    pub constraints: usize,
}

impl StatsResponse {
    pub fn new(cache: CacheStats, store: Option<StoreStats>, constraints: usize) -> Self {
        Self {
            hit_rate: cache.hit_rate(),
            cache,
            store,
            constraints,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

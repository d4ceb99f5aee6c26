//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::time::Duration;

use tracing::warn;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of records the in-memory backing store can hold
    pub max_entries: usize,
    /// TTL in seconds applied by the backing store to every record
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Upper bound on a single backing-store call, in milliseconds
    pub store_timeout_ms: u64,
    /// Delete a record as soon as a read finds it stale
    pub evict_on_stale: bool,
    /// Initial constraint versions, as `(name, version)` pairs
    pub constraint_seed: Vec<(String, u64)>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum stored records (default: 1000)
    /// - `DEFAULT_TTL` - Record TTL in seconds (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `STORE_TIMEOUT_MS` - Backing store call timeout (default: 250)
    /// - `EVICT_ON_STALE` - `true`/`1` to delete stale records (default: false)
    /// - `CONSTRAINT_SEED` - e.g. `constraint:db.books=33,constraint:db.author=456`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: parse_var("MAX_ENTRIES").unwrap_or(defaults.max_entries),
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            store_timeout_ms: parse_var("STORE_TIMEOUT_MS").unwrap_or(defaults.store_timeout_ms),
            evict_on_stale: env::var("EVICT_ON_STALE")
                .ok()
                .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
                .unwrap_or(defaults.evict_on_stale),
            constraint_seed: env::var("CONSTRAINT_SEED")
                .map(|v| parse_seed(&v))
                .unwrap_or_default(),
        }
    }

    /// Backing store timeout as a Duration.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: 300,
            server_port: 3000,
            cleanup_interval: 1,
            store_timeout_ms: 250,
            evict_on_stale: false,
            constraint_seed: Vec::new(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Parses `name=version` pairs separated by commas.
///
/// Malformed pairs are skipped with a warning rather than failing startup.
pub fn parse_seed(raw: &str) -> Vec<(String, u64)> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let parsed = pair
                .rsplit_once('=')
                .and_then(|(name, version)| {
                    let name = name.trim();
                    let version = version.trim().parse::<u64>().ok()?;
                    (!name.is_empty()).then(|| (name.to_string(), version))
                });
            if parsed.is_none() {
                warn!("Ignoring malformed constraint seed entry: {}", pair);
            }
            parsed
        })
        .collect()
}

//! Engine configuration.
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! `MEDIAPULSE_*` environment variables. Every knob has a safe default so
//! the engine runs with zero configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Default TTL for cached query responses, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
/// Default page size when a query does not specify a limit.
pub const DEFAULT_LIMIT: usize = 100;
/// Hard upper bound on page size.
pub const DEFAULT_MAX_LIMIT: usize = 1000;
/// Snapshot size fetched from the store for item queries and searches.
pub const DEFAULT_QUERY_FETCH_LIMIT: usize = 10_000;
/// Snapshot size fetched from the store for aggregation queries.
pub const DEFAULT_AGGREGATION_FETCH_LIMIT: usize = 10_000;
/// Cap on the number of author buckets an aggregation returns.
pub const DEFAULT_AUTHOR_BUCKET_LIMIT: usize = 100;
/// Busy timeout applied to the content store, in seconds.
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 5;

/// Tunable parameters for the query engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// TTL for cached query responses, in seconds.
    pub cache_ttl_secs: u64,
    /// Page size applied when a query asks for 0 items.
    pub default_limit: usize,
    /// Hard upper bound on page size; larger requests are clamped.
    pub max_limit: usize,
    /// How many items to pull from the store as a query/search snapshot.
    /// The newest rows win; matches beyond this cap are truncated, so
    /// `total` is reported against the snapshot, not the whole table.
    pub query_fetch_limit: usize,
    /// How many items to pull from the store as an aggregation snapshot.
    pub aggregation_fetch_limit: usize,
    /// Cap on author buckets per aggregation.
    pub author_bucket_limit: usize,
    /// Busy timeout for the content store, in seconds.
    pub store_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            default_limit: DEFAULT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
            query_fetch_limit: DEFAULT_QUERY_FETCH_LIMIT,
            aggregation_fetch_limit: DEFAULT_AGGREGATION_FETCH_LIMIT,
            author_bucket_limit: DEFAULT_AUTHOR_BUCKET_LIMIT,
            store_timeout_secs: DEFAULT_STORE_TIMEOUT_SECS,
        }
    }
}

impl EngineConfig {
    /// Creates a config with built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cache TTL in seconds.
    #[must_use]
    pub const fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = secs;
        self
    }

    /// Sets the default and maximum page sizes.
    #[must_use]
    pub const fn with_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    /// Sets the query/search snapshot size.
    #[must_use]
    pub const fn with_query_fetch_limit(mut self, limit: usize) -> Self {
        self.query_fetch_limit = limit;
        self
    }

    /// Sets the aggregation snapshot size.
    #[must_use]
    pub const fn with_aggregation_fetch_limit(mut self, limit: usize) -> Self {
        self.aggregation_fetch_limit = limit;
        self
    }

    /// Sets the author bucket cap.
    #[must_use]
    pub const fn with_author_bucket_limit(mut self, limit: usize) -> Self {
        self.author_bucket_limit = limit;
        self
    }

    /// Sets the store busy timeout in seconds.
    #[must_use]
    pub const fn with_store_timeout_secs(mut self, secs: u64) -> Self {
        self.store_timeout_secs = secs;
        self
    }

    /// Clamps a requested page size into `[1, max_limit]`, substituting the
    /// default for 0.
    #[must_use]
    pub fn clamp_limit(&self, requested: usize) -> usize {
        if requested == 0 {
            self.default_limit
        } else {
            requested.min(self.max_limit)
        }
    }

    /// Builds a config from defaults overridden by `MEDIAPULSE_*`
    /// environment variables. Unparseable values are ignored with a
    /// warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Loads a config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.as_ref().display())))?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", path.as_ref().display())))
    }

    /// Loads the config from the user's config directory if a file exists
    /// there, then applies environment overrides. Missing or broken files
    /// fall back to defaults.
    #[must_use]
    pub fn load_default() -> Self {
        let from_file = directories::ProjectDirs::from("", "", "mediapulse")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .filter(|path| path.exists())
            .and_then(|path| match Self::load_from_file(&path) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config file");
                    Some(config)
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring broken config file");
                    None
                },
            });
        from_file.unwrap_or_default().apply_env()
    }

    fn apply_env(mut self) -> Self {
        if let Some(v) = env_parse("MEDIAPULSE_CACHE_TTL_SECS") {
            self.cache_ttl_secs = v;
        }
        if let Some(v) = env_parse("MEDIAPULSE_DEFAULT_LIMIT") {
            self.default_limit = v;
        }
        if let Some(v) = env_parse("MEDIAPULSE_MAX_LIMIT") {
            self.max_limit = v;
        }
        if let Some(v) = env_parse("MEDIAPULSE_QUERY_FETCH_LIMIT") {
            self.query_fetch_limit = v;
        }
        if let Some(v) = env_parse("MEDIAPULSE_AGGREGATION_FETCH_LIMIT") {
            self.aggregation_fetch_limit = v;
        }
        if let Some(v) = env_parse("MEDIAPULSE_AUTHOR_BUCKET_LIMIT") {
            self.author_bucket_limit = v;
        }
        if let Some(v) = env_parse("MEDIAPULSE_STORE_TIMEOUT_SECS") {
            self.store_timeout_secs = v;
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(name, value = raw, "Ignoring unparseable environment override");
            None
        },
    }
}

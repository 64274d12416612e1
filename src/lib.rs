//! # Mediapulse
//!
//! Ranking and aggregation engine for crawled social media content.
//!
//! Mediapulse is the query core shared by a live-crawl post-processing path
//! and a historical query API: it resolves time windows, filters and ranks
//! content items, buckets them into aggregates, and wraps the whole pipeline
//! in a cache-aside layer with TTL expiry and pattern invalidation.
//!
//! ## Features
//!
//! - Multi-criteria stable ranking (hot, recent, trending, popular, relevance)
//! - Time-bucketed and field-bucketed aggregation with summary statistics
//! - Cache-aside query caching with graceful degradation
//! - Retention cleanup with dry-run preview
//! - Pluggable store backends (`SQLite` store, in-memory cache)
//!
//! ## Example
//!
//! ```rust,ignore
//! use mediapulse::{ContentQuery, QueryOrchestrator, SortBy};
//!
//! let orchestrator = QueryOrchestrator::new(store, cache, config);
//! let response = orchestrator.query(
//!     &ContentQuery::new().with_time_range("7d").with_sort(SortBy::Hot, true),
//! )?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod gc;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::EngineConfig;
pub use gc::{RetentionManager, RetentionResult};
pub use models::{
    AggregateDimension, AggregationBucket, AggregationReport, AggregationSummary, ContentId,
    ContentItem, ContentQuery, Platform, QueryResponse, QueryStats, SearchResponse, SortBy,
    TimeWindow,
};
pub use services::{
    AggregationEngine, ExportFormat, ExportResult, QueryCache, QueryOrchestrator, RankingEngine,
    resolve_window,
};
pub use storage::{CacheStore, ContentStore, MemoryCacheStore, SqliteContentStore};

/// Error type for mediapulse operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidRange` | Explicit `start,end` time range where either half fails to parse |
/// | `UnsupportedDimension` | Aggregation dimension outside `day/week/month/platform/author` |
/// | `UnsupportedCriterion` | Sort key string outside the fixed criterion set |
/// | `UnsupportedFormat` | Export format outside `csv/json` |
/// | `StoreUnavailable` | Content store unreachable or a store operation fails |
/// | `ExportFailed` | Result export fails to serialize |
/// | `Config` | Configuration file missing, unreadable, or malformed |
///
/// `InvalidRange` never crosses the public resolver boundary: the resolver
/// recovers by falling back to the default 7-day window. Cache failures are
/// never surfaced as errors at all; the cache layer degrades to direct
/// computation.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Malformed explicit time range.
    ///
    /// Raised when a `start,end` range string contains a half that does not
    /// parse as an ISO-8601 timestamp. Recovered internally by falling back
    /// to the default window rather than propagating.
    #[error("invalid time range: {spec}")]
    InvalidRange {
        /// The range specification that failed to parse.
        spec: String,
    },

    /// Aggregation dimension not in the supported set.
    ///
    /// Fatal; surfaced to the caller, which owns user-facing messaging.
    #[error("unsupported aggregation dimension: {0}")]
    UnsupportedDimension(String),

    /// Sort criterion not in the supported set.
    ///
    /// Fatal; surfaced to the caller.
    #[error("unsupported sort criterion: {0}")]
    UnsupportedCriterion(String),

    /// Export format not in the supported set.
    ///
    /// Fatal; surfaced to the caller.
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// The content store is unreachable or an operation against it failed.
    ///
    /// Fatal and not retried by this crate; retry policy, if any, belongs to
    /// the store adapter.
    #[error("store operation '{operation}' failed: {cause}")]
    StoreUnavailable {
        /// The store operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A result export failed to serialize.
    #[error("export '{operation}' failed: {cause}")]
    ExportFailed {
        /// The export step that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for mediapulse operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Centralized to avoid duplicate implementations across the codebase.
/// Uses `SystemTime::now()` with fallback to 0 if the system clock is before
/// the Unix epoch.
///
/// # Examples
///
/// ```rust
/// use mediapulse::current_timestamp;
///
/// let ts = current_timestamp();
/// assert!(ts > 0);
/// ```
#[must_use]
pub fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

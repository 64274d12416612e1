//! Age-based deletion of stored content.
//!
//! A cleanup pass deletes items whose `publish_time` falls before a cutoff,
//! optionally scoped to a platform set. Dry runs count what a real run
//! would remove, using the same predicate, so the preview never lies.
//! Real runs invalidate the whole query-cache prefix afterwards; cached
//! responses must not outlive the data they were computed from.

use crate::models::{CACHE_KEY_PREFIX, Platform};
use crate::services::QueryCache;
use crate::storage::ContentStore;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Rough on-disk footprint per record, used for the freed-space estimate.
const MB_PER_RECORD: f64 = 0.1;

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RetentionResult {
    /// Items deleted, or would-be deleted on a dry run.
    pub deleted_count: u64,
    /// Estimated space reclaimed, in megabytes.
    pub freed_space_mb: f64,
    /// Whether this was a preview.
    pub dry_run: bool,
    /// Wall-clock duration of the pass, in milliseconds.
    pub duration_ms: u64,
}

/// Deletes aged-out content and keeps the query cache consistent with it.
#[derive(Clone)]
pub struct RetentionManager {
    store: Arc<dyn ContentStore>,
    cache: QueryCache,
}

impl std::fmt::Debug for RetentionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetentionManager").finish_non_exhaustive()
    }
}

impl RetentionManager {
    /// Creates a retention manager over the given store and cache.
    #[must_use]
    pub fn new(store: Arc<dyn ContentStore>, cache: QueryCache) -> Self {
        Self { store, cache }
    }

    /// Removes items published before `cutoff`.
    ///
    /// With `dry_run` set, counts matching items and changes nothing. A real
    /// run deletes them and then invalidates every cached query response,
    /// since any of them may have included the deleted items.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the store fails. The
    /// pass is not retried; the next scheduled run picks the items up again.
    #[instrument(skip(self), fields(cutoff = %cutoff, dry_run))]
    pub fn cleanup(
        &self,
        cutoff: DateTime<Utc>,
        platforms: Option<&[Platform]>,
        dry_run: bool,
    ) -> Result<RetentionResult> {
        let started = Instant::now();

        let deleted_count = if dry_run {
            self.store.count_older_than(cutoff, platforms)?
        } else {
            let deleted = self.store.delete_older_than(cutoff, platforms)?;
            counter!("mediapulse_retention_deleted_total").increment(deleted);
            let invalidated = self.cache.invalidate_prefix(CACHE_KEY_PREFIX);
            info!(deleted, invalidated, "Retention cleanup applied");
            deleted
        };

        #[allow(clippy::cast_precision_loss)]
        let freed_space_mb = deleted_count as f64 * MB_PER_RECORD;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if dry_run {
            info!(would_delete = deleted_count, "Retention dry run");
        }

        Ok(RetentionResult {
            deleted_count,
            freed_space_mb,
            dry_run,
            duration_ms,
        })
    }

    /// Convenience wrapper: removes items older than `days` days.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the store fails.
    pub fn cleanup_older_than_days(
        &self,
        days: i64,
        platforms: Option<&[Platform]>,
        dry_run: bool,
    ) -> Result<RetentionResult> {
        self.cleanup(Utc::now() - Duration::days(days), platforms, dry_run)
    }
}

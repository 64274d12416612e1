//! Content store trait.

use crate::Result;
use crate::models::{ContentId, ContentItem, Platform, TimeWindow};
use chrono::{DateTime, Utc};

/// Persistent store of crawled content items.
///
/// Implementations must be safe to share across threads; the orchestrator
/// holds a single `Arc<dyn ContentStore>`.
pub trait ContentStore: Send + Sync {
    /// Inserts an item, replacing any existing row with the same platform
    /// and id. Recrawls of the same post update counters in place.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the backend fails.
    fn insert(&self, item: &ContentItem) -> Result<()>;

    /// Inserts a batch of items.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the backend fails;
    /// the batch is not atomic unless the implementation makes it so.
    fn insert_many(&self, items: &[ContentItem]) -> Result<()> {
        for item in items {
            self.insert(item)?;
        }
        Ok(())
    }

    /// Looks up a single item by its platform-scoped id. Ids are only
    /// unique within a platform, so the platform is part of the key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the backend fails.
    fn get(&self, platform: Platform, id: &ContentId) -> Result<Option<ContentItem>>;

    /// Fetches items whose `publish_time` falls inside the window,
    /// optionally restricted to a platform set and a coarse text match
    /// over title and body. Finer filtering (engagement bounds, tags,
    /// authors, scoring) happens in memory above the store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the backend fails.
    fn fetch(
        &self,
        window: &TimeWindow,
        platforms: Option<&[Platform]>,
        search_text: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ContentItem>>;

    /// Counts items with `publish_time` strictly before the cutoff.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the backend fails.
    fn count_older_than(
        &self,
        cutoff: DateTime<Utc>,
        platforms: Option<&[Platform]>,
    ) -> Result<u64>;

    /// Deletes items with `publish_time` strictly before the cutoff and
    /// returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the backend fails.
    fn delete_older_than(
        &self,
        cutoff: DateTime<Utc>,
        platforms: Option<&[Platform]>,
    ) -> Result<u64>;
}

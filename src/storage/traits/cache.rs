//! Cache store trait.

use crate::Result;

/// Key-value cache with per-entry TTL and prefix invalidation.
///
/// Values are opaque strings; serialization belongs to the layer above.
/// Expired entries behave as absent, whether or not the backend reclaims
/// them eagerly.
pub trait CacheStore: Send + Sync {
    /// Returns the live value for `key`, or `None` if absent or expired.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the backend fails.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, expiring after `ttl_secs` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the backend fails.
    fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// Deletes every entry whose key starts with `prefix`, returning the
    /// count removed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the backend fails.
    fn delete_prefix(&self, prefix: &str) -> Result<u64>;
}

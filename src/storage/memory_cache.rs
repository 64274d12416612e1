//! In-process cache store.
//!
//! A `Mutex<HashMap>` with lazy expiry. Expired entries are dropped when
//! read, not on a timer, so the map can briefly hold dead entries between
//! accesses. Suitable for single-process deployments and tests; a shared
//! deployment would put a networked cache behind the same trait.

use crate::storage::CacheStore;
use crate::{Error, Result, current_timestamp};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: i64,
}

/// In-memory [`CacheStore`] with per-entry TTL.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCacheStore {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, including not-yet-reclaimed
    /// expired ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Returns true when the cache holds no entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries.lock().map_err(|e| Error::StoreUnavailable {
            operation: "cache_lock".to_string(),
            cause: e.to_string(),
        })
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.lock()?;
        let now = current_timestamp();
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            },
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let expires_at = current_timestamp().saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX));
        self.lock()?.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn delete_prefix(&self, prefix: &str) -> Result<u64> {
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok(u64::try_from(before - entries.len()).unwrap_or(u64::MAX))
    }
}

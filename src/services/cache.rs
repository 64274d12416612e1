//! Cache-aside query caching.
//!
//! Wraps a [`CacheStore`] with serialize/deserialize plumbing and the
//! degradation policy: a broken cache slows queries down, it never fails
//! them. Every cache error is logged and counted, then the computation runs
//! directly against storage.

use crate::storage::CacheStore;
use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache-aside wrapper over a pluggable cache store.
#[derive(Clone)]
pub struct QueryCache {
    store: Arc<dyn CacheStore>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache").finish_non_exhaustive()
    }
}

impl QueryCache {
    /// Creates a cache layer over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Looks up `key`, computing and storing the value on a miss.
    ///
    /// Cache read errors, deserialization failures of stale payloads, and
    /// cache write errors are all downgraded to warnings; only `compute`
    /// itself can fail the call.
    ///
    /// # Errors
    ///
    /// Propagates errors from `compute` only.
    pub fn get_or_compute<T, F>(&self, key: &str, ttl_secs: u64, compute: F) -> crate::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> crate::Result<T>,
    {
        match self.store.get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    counter!("mediapulse_cache_hits_total").increment(1);
                    debug!(key, "Cache hit");
                    return Ok(value);
                },
                Err(e) => {
                    // Stale or incompatible payload; fall through to compute.
                    counter!("mediapulse_cache_errors_total").increment(1);
                    warn!(key, error = %e, "Discarding undecodable cache entry");
                },
            },
            Ok(None) => {},
            Err(e) => {
                counter!("mediapulse_cache_errors_total").increment(1);
                warn!(key, error = %e, "Cache read failed, computing directly");
            },
        }

        counter!("mediapulse_cache_misses_total").increment(1);
        let value = compute()?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(e) = self.store.set(key, &raw, ttl_secs) {
                    counter!("mediapulse_cache_errors_total").increment(1);
                    warn!(key, error = %e, "Cache write failed");
                }
            },
            Err(e) => {
                counter!("mediapulse_cache_errors_total").increment(1);
                warn!(key, error = %e, "Failed to serialize value for caching");
            },
        }

        Ok(value)
    }

    /// Deletes every entry whose key starts with `prefix`.
    ///
    /// Returns the number of entries removed; a failing store is logged and
    /// reported as 0 removals.
    pub fn invalidate_prefix(&self, prefix: &str) -> u64 {
        match self.store.delete_prefix(prefix) {
            Ok(n) => {
                debug!(prefix, removed = n, "Invalidated cache entries");
                n
            },
            Err(e) => {
                counter!("mediapulse_cache_errors_total").increment(1);
                warn!(prefix, error = %e, "Cache invalidation failed");
                0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCacheStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A store whose every operation fails, for degradation tests.
    struct BrokenStore;

    impl CacheStore for BrokenStore {
        fn get(&self, _key: &str) -> crate::Result<Option<String>> {
            Err(crate::Error::StoreUnavailable {
                operation: "get".to_string(),
                cause: "broken".to_string(),
            })
        }

        fn set(&self, _key: &str, _value: &str, _ttl_secs: u64) -> crate::Result<()> {
            Err(crate::Error::StoreUnavailable {
                operation: "set".to_string(),
                cause: "broken".to_string(),
            })
        }

        fn delete_prefix(&self, _prefix: &str) -> crate::Result<u64> {
            Err(crate::Error::StoreUnavailable {
                operation: "delete_prefix".to_string(),
                cause: "broken".to_string(),
            })
        }
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = QueryCache::new(Arc::new(MemoryCacheStore::new()));
        let calls = AtomicUsize::new(0);

        let first: u64 = cache
            .get_or_compute("k", 60, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            })
            .unwrap();
        let second: u64 = cache
            .get_or_compute("k", 60, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(99)
            })
            .unwrap();

        assert_eq!(first, 42);
        assert_eq!(second, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_broken_cache_degrades_to_compute() {
        let cache = QueryCache::new(Arc::new(BrokenStore));
        let value: String = cache
            .get_or_compute("k", 60, || Ok("computed".to_string()))
            .unwrap();
        assert_eq!(value, "computed");
    }

    #[test]
    fn test_compute_error_propagates() {
        let cache = QueryCache::new(Arc::new(MemoryCacheStore::new()));
        let result: crate::Result<u64> = cache.get_or_compute("k", 60, || {
            Err(crate::Error::StoreUnavailable {
                operation: "fetch".to_string(),
                cause: "db gone".to_string(),
            })
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_undecodable_entry_is_recomputed() {
        let store = Arc::new(MemoryCacheStore::new());
        store.set("k", "not json at all {", 60).unwrap();
        let cache = QueryCache::new(store);
        let value: u64 = cache.get_or_compute("k", 60, || Ok(7)).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_invalidate_prefix() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = QueryCache::new(store.clone());
        store.set("historical:a", "1", 60).unwrap();
        store.set("historical:b", "2", 60).unwrap();
        store.set("other:c", "3", 60).unwrap();

        assert_eq!(cache.invalidate_prefix("historical:"), 2);
        assert_eq!(store.get("other:c").unwrap(), Some("3".to_string()));
    }

    #[test]
    fn test_invalidate_on_broken_store_reports_zero() {
        let cache = QueryCache::new(Arc::new(BrokenStore));
        assert_eq!(cache.invalidate_prefix("historical:"), 0);
    }
}

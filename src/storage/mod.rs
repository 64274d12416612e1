//! Storage backends.
//!
//! The content store persists crawled items; the cache store holds
//! short-lived query results. Both are trait objects so deployments can
//! swap backends without touching the engines.

mod memory_cache;
mod sqlite;
pub mod traits;

pub use memory_cache::MemoryCacheStore;
pub use sqlite::SqliteContentStore;
pub use traits::{CacheStore, ContentStore};

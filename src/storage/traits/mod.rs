//! Storage abstraction traits.
//!
//! Backends plug in behind these traits; everything above them is
//! backend-agnostic.

mod cache;
mod store;

pub use cache::CacheStore;
pub use store::ContentStore;

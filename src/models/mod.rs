//! Data models for mediapulse.
//!
//! This module contains all the core data structures used throughout the system.

mod aggregate;
mod content;
mod query;
mod response;
pub mod window;

pub use aggregate::{AggregationBucket, AggregationReport, AggregationSummary};
pub use content::{ContentId, ContentItem, Platform};
pub use query::{AggregateDimension, CACHE_KEY_PREFIX, ContentQuery, SortBy};
pub use response::{QueryResponse, QueryStats, ScoredItem, SearchResponse};
pub use window::TimeWindow;

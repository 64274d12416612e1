//! Aggregation output types.
//!
//! Buckets are produced only by the aggregation engine and live for the
//! single aggregation call; they are never persisted.

use serde::{Deserialize, Serialize};

/// A single aggregation bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationBucket {
    /// Bucket key: a date (`2024-01-15`), ISO week (`2024-W03`), month
    /// (`2024-01`), platform name or author name.
    pub key: String,
    /// Number of items in the bucket.
    pub count: u64,
    /// Summed total engagement of the bucket's items.
    pub total_engagement: u64,
    /// Number of distinct authors within the bucket.
    pub unique_authors: u64,
}

/// Summary statistics derived from a bucket list.
///
/// Derived from the buckets, not recomputed from raw items, so it stays
/// consistent with what the caller sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationSummary {
    /// Total item count across buckets.
    pub total_count: u64,
    /// Total engagement across buckets.
    pub total_engagement: u64,
    /// Average engagement per item; 0 when there are no items.
    pub average_engagement_per_item: f64,
    /// Number of buckets.
    pub data_points: usize,
}

/// Result of an aggregation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationReport {
    /// The buckets, in dimension-specific order.
    pub buckets: Vec<AggregationBucket>,
    /// Summary statistics over the buckets.
    pub summary: AggregationSummary,
}

//! Bucketed aggregation over content items.
//!
//! Groups an in-memory snapshot of items along one dimension and derives
//! per-bucket counts, engagement totals and distinct-author counts, plus a
//! summary computed from the buckets themselves. Aggregation never touches
//! storage; the orchestrator fetches the snapshot and hands it over.

use crate::models::{AggregateDimension, AggregationBucket, AggregationReport, AggregationSummary, ContentItem};
use std::collections::{HashMap, HashSet};

/// Default cap on the number of author buckets returned.
pub const DEFAULT_AUTHOR_BUCKET_LIMIT: usize = 100;

/// Groups content items into buckets along a single dimension.
#[derive(Debug, Clone, Copy)]
pub struct AggregationEngine {
    author_bucket_limit: usize,
}

impl Default for AggregationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregationEngine {
    /// Creates an engine with the default author bucket cap.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            author_bucket_limit: DEFAULT_AUTHOR_BUCKET_LIMIT,
        }
    }

    /// Overrides the author bucket cap.
    #[must_use]
    pub const fn with_author_bucket_limit(mut self, limit: usize) -> Self {
        self.author_bucket_limit = limit;
        self
    }

    /// Aggregates items along the given dimension.
    ///
    /// Temporal buckets (day, week, month) come back ascending by key;
    /// categorical buckets (platform, author) descending by total
    /// engagement, ties broken by key so the order is deterministic.
    /// Author aggregation is truncated to the configured cap; the summary
    /// covers only the surviving buckets.
    #[must_use]
    pub fn aggregate(&self, items: &[ContentItem], dimension: AggregateDimension) -> AggregationReport {
        let mut groups: HashMap<String, BucketAccumulator> = HashMap::new();
        for item in items {
            let key = bucket_key(item, dimension);
            groups.entry(key).or_default().add(item);
        }

        let mut buckets: Vec<AggregationBucket> = groups
            .into_iter()
            .map(|(key, acc)| acc.into_bucket(key))
            .collect();

        match dimension {
            AggregateDimension::Day | AggregateDimension::Week | AggregateDimension::Month => {
                buckets.sort_by(|a, b| a.key.cmp(&b.key));
            },
            AggregateDimension::Platform | AggregateDimension::Author => {
                buckets.sort_by(|a, b| {
                    b.total_engagement
                        .cmp(&a.total_engagement)
                        .then_with(|| a.key.cmp(&b.key))
                });
            },
        }

        if dimension == AggregateDimension::Author {
            buckets.truncate(self.author_bucket_limit);
        }

        let summary = summarize(&buckets);
        AggregationReport { buckets, summary }
    }
}

/// Per-group running totals while scanning the snapshot.
#[derive(Default)]
struct BucketAccumulator {
    count: u64,
    total_engagement: u64,
    authors: HashSet<String>,
}

impl BucketAccumulator {
    fn add(&mut self, item: &ContentItem) {
        self.count += 1;
        self.total_engagement += item.total_engagement();
        self.authors.insert(item.bucket_author().to_string());
    }

    fn into_bucket(self, key: String) -> AggregationBucket {
        AggregationBucket {
            key,
            count: self.count,
            total_engagement: self.total_engagement,
            unique_authors: u64::try_from(self.authors.len()).unwrap_or(u64::MAX),
        }
    }
}

/// Bucket key for one item along a dimension.
///
/// Temporal keys use the item's `publish_time` in UTC. Weeks are ISO weeks
/// (`%G` is the ISO week-numbering year, which can differ from the calendar
/// year at year boundaries).
fn bucket_key(item: &ContentItem, dimension: AggregateDimension) -> String {
    match dimension {
        AggregateDimension::Day => item.publish_time.format("%Y-%m-%d").to_string(),
        AggregateDimension::Week => item.publish_time.format("%G-W%V").to_string(),
        AggregateDimension::Month => item.publish_time.format("%Y-%m").to_string(),
        AggregateDimension::Platform => item.platform.as_str().to_string(),
        AggregateDimension::Author => item.bucket_author().to_string(),
    }
}

/// Derives the summary from the bucket list.
#[allow(clippy::cast_precision_loss)]
fn summarize(buckets: &[AggregationBucket]) -> AggregationSummary {
    let total_count: u64 = buckets.iter().map(|b| b.count).sum();
    let total_engagement: u64 = buckets.iter().map(|b| b.total_engagement).sum();
    let average_engagement_per_item = if total_count == 0 {
        0.0
    } else {
        total_engagement as f64 / total_count as f64
    };
    AggregationSummary {
        total_count,
        total_engagement,
        average_engagement_per_item,
        data_points: buckets.len(),
    }
}

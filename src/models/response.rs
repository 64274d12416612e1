//! Query response types.

use super::aggregate::AggregationBucket;
use super::content::ContentItem;
use serde::{Deserialize, Serialize};

/// Result of an orchestrated content query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The page of matching items, ranked and paginated.
    pub items: Vec<ContentItem>,
    /// Total match count before pagination.
    pub total: usize,
    /// Statistical summary, present when the query set `include_stats`.
    pub stats: Option<QueryStats>,
}

/// Statistical summary over the full (pre-pagination) match set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryStats {
    /// Number of matching items.
    pub total_items: usize,
    /// Summed total engagement.
    pub total_engagement: u64,
    /// Average engagement per item; 0 when there are no items.
    pub average_engagement: f64,
    /// Per-platform distribution, descending by engagement.
    pub platform_distribution: Vec<AggregationBucket>,
    /// Top authors by engagement, at most 10.
    pub top_authors: Vec<AggregationBucket>,
}

/// Result of a full-text search query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The page of matching items with their relevance scores, ranked and
    /// paginated. Scores are additive and capped per term, not normalized.
    pub items: Vec<ScoredItem>,
    /// Total match count before pagination.
    pub total: usize,
    /// Highest relevance score across the full match set; 0 when empty.
    pub max_relevance: f64,
}

/// A content item with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    /// The matched item.
    pub item: ContentItem,
    /// Relevance score for the search text.
    pub relevance_score: f64,
}

//! Query types: sort criteria, aggregation dimensions and the caller-facing
//! query shape.

use super::content::Platform;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Cache key prefix for orchestrated query results.
///
/// Retention cleanup invalidates this prefix after deleting underlying data.
pub const CACHE_KEY_PREFIX: &str = "historical:";

/// Sort criteria for content queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Total engagement: likes + comments + shares + collects.
    Hot,
    /// Publish time (newest first when descending).
    #[default]
    Recent,
    /// Engagement velocity: `(likes + comments) / max(1, days_since_publish + 1)`.
    Trending,
    /// Total views/impressions.
    Popular,
    /// Keyword relevance score; only meaningful for search queries and falls
    /// back to [`SortBy::Recent`] outside of them.
    Relevant,
    /// Like count.
    Likes,
    /// Comment count.
    Comments,
    /// Share/repost count.
    Shares,
}

impl SortBy {
    /// Returns the criterion as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Recent => "recent",
            Self::Trending => "trending",
            Self::Popular => "popular",
            Self::Relevant => "relevant",
            Self::Likes => "likes",
            Self::Comments => "comments",
            Self::Shares => "shares",
        }
    }

    /// Parses a criterion string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCriterion`] for strings outside the fixed
    /// criterion set. This is fatal and surfaced to the caller.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "hot" => Ok(Self::Hot),
            "recent" => Ok(Self::Recent),
            "trending" => Ok(Self::Trending),
            "popular" => Ok(Self::Popular),
            "relevant" => Ok(Self::Relevant),
            "likes" => Ok(Self::Likes),
            "comments" => Ok(Self::Comments),
            "shares" => Ok(Self::Shares),
            other => Err(Error::UnsupportedCriterion(other.to_string())),
        }
    }
}

/// Aggregation dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateDimension {
    /// Bucket by UTC calendar date of `publish_time`.
    Day,
    /// Bucket by ISO week of `publish_time`.
    Week,
    /// Bucket by calendar month of `publish_time`.
    Month,
    /// Bucket by source platform.
    Platform,
    /// Bucket by author, truncated to the top 100 by engagement.
    Author,
}

impl AggregateDimension {
    /// Returns the dimension as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Platform => "platform",
            Self::Author => "author",
        }
    }

    /// Parses a dimension string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDimension`] for strings outside the fixed
    /// dimension set. This is fatal and surfaced to the caller.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "platform" => Ok(Self::Platform),
            "author" => Ok(Self::Author),
            other => Err(Error::UnsupportedDimension(other.to_string())),
        }
    }
}

/// Caller-supplied query shape.
///
/// Immutable once constructed. Serializes with stable (declaration-order)
/// field ordering, so the serialized form doubles as the cache key:
/// semantically identical queries collide, distinct queries never do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentQuery {
    /// Time range spec string (e.g. `"7d"`, `"all"`,
    /// `"2024-01-01,2024-01-31"`). Resolved at query time, never cached.
    pub time_range: String,
    /// Restrict to these platforms; `None` matches all.
    pub platforms: Option<Vec<Platform>>,
    /// Restrict to these author names; `None` matches all.
    pub authors: Option<Vec<String>>,
    /// Restrict to items carrying any of these tags; `None` matches all.
    pub tags: Option<Vec<String>>,
    /// Free-text keyword filter; also drives relevance scoring.
    pub search_text: Option<String>,
    /// Minimum total engagement (inclusive).
    pub min_engagement: Option<u64>,
    /// Maximum total engagement (inclusive).
    pub max_engagement: Option<u64>,
    /// Sort criterion.
    pub sort_by: SortBy,
    /// Sort in descending order.
    pub sort_desc: bool,
    /// Maximum number of items to return.
    pub limit: usize,
    /// Number of items to skip.
    pub offset: usize,
    /// Aggregation dimension, when the caller wants buckets instead of items.
    pub aggregate_by: Option<AggregateDimension>,
    /// Include a statistical summary alongside the items.
    pub include_stats: bool,
}

impl Default for ContentQuery {
    fn default() -> Self {
        Self {
            time_range: "7d".to_string(),
            platforms: None,
            authors: None,
            tags: None,
            search_text: None,
            min_engagement: None,
            max_engagement: None,
            sort_by: SortBy::default(),
            sort_desc: true,
            limit: 100,
            offset: 0,
            aggregate_by: None,
            include_stats: false,
        }
    }
}

impl ContentQuery {
    /// Creates a query with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time range spec.
    #[must_use]
    pub fn with_time_range(mut self, spec: impl Into<String>) -> Self {
        self.time_range = spec.into();
        self
    }

    /// Restricts the query to the given platforms.
    #[must_use]
    pub fn with_platforms(mut self, platforms: Vec<Platform>) -> Self {
        self.platforms = Some(platforms);
        self
    }

    /// Sets the free-text keyword filter.
    #[must_use]
    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// Sets engagement bounds. Either side may be `None`.
    #[must_use]
    pub const fn with_engagement_bounds(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.min_engagement = min;
        self.max_engagement = max;
        self
    }

    /// Sets the sort criterion and direction.
    #[must_use]
    pub const fn with_sort(mut self, sort_by: SortBy, descending: bool) -> Self {
        self.sort_by = sort_by;
        self.sort_desc = descending;
        self
    }

    /// Sets pagination.
    #[must_use]
    pub const fn with_pagination(mut self, limit: usize, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Sets the aggregation dimension.
    #[must_use]
    pub const fn with_aggregation(mut self, dimension: AggregateDimension) -> Self {
        self.aggregate_by = Some(dimension);
        self
    }

    /// Requests a statistical summary alongside the items.
    #[must_use]
    pub const fn with_stats(mut self) -> Self {
        self.include_stats = true;
        self
    }

    /// Derives the cache key from the full serialized query.
    ///
    /// `serde_json` emits struct fields in declaration order, so the key is
    /// deterministic for a given query.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let body = serde_json::to_string(self).unwrap_or_default();
        format!("{CACHE_KEY_PREFIX}{body}")
    }
}

//! Content item types and identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform-scoped identifier for a content item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Creates a new content ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ContentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ContentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Supported source platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Weibo microblog posts.
    Weibo,
    /// Xiaohongshu notes.
    Xiaohongshu,
    /// Douyin short videos.
    Douyin,
}

impl Platform {
    /// Returns all supported platforms.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Weibo, Self::Xiaohongshu, Self::Douyin]
    }

    /// Returns the platform as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Weibo => "weibo",
            Self::Xiaohongshu => "xiaohongshu",
            Self::Douyin => "douyin",
        }
    }

    /// Parses a platform string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "weibo" => Some(Self::Weibo),
            "xiaohongshu" | "xhs" => Some(Self::Xiaohongshu),
            "douyin" => Some(Self::Douyin),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single crawled content unit.
///
/// Engagement counters default to 0 when the source platform does not report
/// them. `publish_time` is immutable once set; `crawl_time >= publish_time`
/// is expected but not enforced (crawl lag is tolerated, not validated).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Unique content ID from the platform.
    pub id: ContentId,
    /// Source platform.
    pub platform: Platform,
    /// Content title, when the platform has one.
    pub title: Option<String>,
    /// Main content text.
    pub body: String,
    /// Content URL.
    pub url: String,
    /// Number of likes.
    #[serde(default)]
    pub likes: u64,
    /// Number of collects/bookmarks.
    #[serde(default)]
    pub collects: u64,
    /// Number of comments.
    #[serde(default)]
    pub comments: u64,
    /// Number of shares.
    #[serde(default)]
    pub shares: u64,
    /// Number of views, when the platform reports them.
    #[serde(default)]
    pub views: Option<u64>,
    /// Platform-specific repost counter, an alias for shares on platforms
    /// that report reposts instead.
    #[serde(default)]
    pub reposts: Option<u64>,
    /// Author display name.
    pub author: String,
    /// Author ID.
    pub author_id: String,
    /// Content publish time. Immutable once set.
    pub publish_time: DateTime<Utc>,
    /// When the content was crawled. Defaults to ingestion time.
    #[serde(default = "Utc::now")]
    pub crawl_time: DateTime<Utc>,
    /// Content tags/hashtags, in platform order.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ContentItem {
    /// Total engagement: likes + comments + shares + collects.
    ///
    /// Computed on demand, never stored, so it cannot go stale against the
    /// underlying counters.
    #[must_use]
    pub const fn total_engagement(&self) -> u64 {
        self.likes + self.comments + self.shares + self.collects
    }

    /// Share counter with the platform-specific `reposts` alias applied.
    ///
    /// Falls back to `reposts` only when `shares` is absent (zero).
    #[must_use]
    pub const fn share_count(&self) -> u64 {
        if self.shares > 0 {
            self.shares
        } else {
            match self.reposts {
                Some(r) => r,
                None => 0,
            }
        }
    }

    /// View counter, 0 when the platform does not report views.
    #[must_use]
    pub const fn view_count(&self) -> u64 {
        match self.views {
            Some(v) => v,
            None => 0,
        }
    }

    /// Author name used for bucketing, `"unknown"` when the field is empty.
    #[must_use]
    pub fn bucket_author(&self) -> &str {
        if self.author.is_empty() {
            "unknown"
        } else {
            &self.author
        }
    }
}

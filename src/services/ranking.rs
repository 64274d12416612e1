//! Multi-criteria content ranking and relevance scoring.
//!
//! All criteria sort with a **stable** sort: items with equal keys keep
//! their relative input order. HOT and TRENDING tie frequently on sparse
//! engagement data, and downstream consumers depend on deterministic
//! ordering across runs.
//!
//! Ranking never fails on malformed individual items; missing counters
//! default to 0 and an item can at worst sort last, never abort the sort.

use crate::models::{ContentItem, SortBy};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Orders content items by one of several criteria and computes relevance
/// scores for keyword search.
///
/// Stateless: operates on an in-memory snapshot passed by the caller and
/// never mutates shared state, so it needs no locking.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankingEngine;

impl RankingEngine {
    /// Creates a new ranking engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Ranks items by the given criterion, relative to the current time.
    #[must_use]
    pub fn rank(
        &self,
        items: Vec<ContentItem>,
        criterion: SortBy,
        descending: bool,
    ) -> Vec<ContentItem> {
        self.rank_at(items, criterion, descending, Utc::now())
    }

    /// Ranks items against an explicit "now" (used by TRENDING velocity).
    ///
    /// Exposed separately so callers (and tests) can pin the ranking instant.
    #[must_use]
    pub fn rank_at(
        &self,
        mut items: Vec<ContentItem>,
        criterion: SortBy,
        descending: bool,
        now: DateTime<Utc>,
    ) -> Vec<ContentItem> {
        match criterion {
            SortBy::Hot => sort_stable(&mut items, descending, ContentItem::total_engagement),
            // RELEVANT is only meaningful with a search query; outside
            // search it falls back to RECENT.
            SortBy::Recent | SortBy::Relevant => {
                sort_stable(&mut items, descending, |i| i.publish_time);
            },
            SortBy::Trending => {
                sort_stable(&mut items, descending, |i| Self::trend_score(i, now));
            },
            SortBy::Popular => sort_stable(&mut items, descending, ContentItem::view_count),
            SortBy::Likes => sort_stable(&mut items, descending, |i| i.likes),
            SortBy::Comments => sort_stable(&mut items, descending, |i| i.comments),
            SortBy::Shares => sort_stable(&mut items, descending, ContentItem::share_count),
        }
        items
    }

    /// Engagement velocity: `(likes + comments) / max(1, days_since_publish + 1)`.
    ///
    /// Items published today get denominator 1; the denominator can never be
    /// zero, including for items with a future `publish_time`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn trend_score(item: &ContentItem, now: DateTime<Utc>) -> f64 {
        let days_since = now.signed_duration_since(item.publish_time).num_days();
        let denominator = (days_since + 1).max(1);
        (item.likes + item.comments) as f64 / denominator as f64
    }

    /// Relevance score of an item against a free-text query.
    ///
    /// Additive weights: +10 for a case-insensitive substring match in the
    /// title, +5 in the body, +3 in any tag, plus an engagement boost of
    /// `total_engagement / 1000` capped at 5. No further normalization is
    /// applied.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn relevance_score(&self, item: &ContentItem, query_text: &str) -> f64 {
        let needle = query_text.to_lowercase();
        let mut score = 0.0;

        if item
            .title
            .as_ref()
            .is_some_and(|t| t.to_lowercase().contains(&needle))
        {
            score += 10.0;
        }
        if item.body.to_lowercase().contains(&needle) {
            score += 5.0;
        }
        if item.tags.iter().any(|t| t.to_lowercase().contains(&needle)) {
            score += 3.0;
        }

        // Engagement boost, capped at 5 points.
        score += (item.total_engagement() as f64 / 1000.0).min(5.0);

        score
    }
}

/// Stable sort over a partially ordered key.
///
/// `Vec::sort_by` is stable, so equal keys preserve relative input order.
/// Incomparable keys (NaN velocity cannot occur, but the guard is cheap to
/// state) compare equal rather than aborting the sort.
fn sort_stable<K: PartialOrd>(
    items: &mut [ContentItem],
    descending: bool,
    key: impl Fn(&ContentItem) -> K,
) {
    items.sort_by(|a, b| {
        let ord = key(a).partial_cmp(&key(b)).unwrap_or(Ordering::Equal);
        if descending { ord.reverse() } else { ord }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentId, Platform};
    use chrono::{Duration, TimeZone};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().unwrap()
    }

    fn item(id: &str, likes: u64, comments: u64, shares: u64, collects: u64) -> ContentItem {
        ContentItem {
            id: ContentId::new(id),
            platform: Platform::Weibo,
            title: None,
            body: format!("body of {id}"),
            url: format!("https://example.com/{id}"),
            likes,
            collects,
            comments,
            shares,
            views: None,
            reposts: None,
            author: "author".to_string(),
            author_id: "author-1".to_string(),
            publish_time: base_time(),
            crawl_time: base_time(),
            tags: Vec::new(),
        }
    }

    fn ids(items: &[ContentItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_hot_ranking_descending() {
        let engine = RankingEngine::new();
        let items = vec![item("low", 1, 0, 0, 0), item("high", 50, 10, 5, 5), item("mid", 10, 5, 0, 0)];
        let ranked = engine.rank_at(items, SortBy::Hot, true, base_time());
        assert_eq!(ids(&ranked), vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_hot_ranking_is_stable_on_ties() {
        let engine = RankingEngine::new();
        // Same total engagement (20), split differently across counters.
        let items = vec![
            item("first", 20, 0, 0, 0),
            item("second", 0, 20, 0, 0),
            item("third", 5, 5, 5, 5),
        ];
        let ranked = engine.rank_at(items, SortBy::Hot, true, base_time());
        assert_eq!(ids(&ranked), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_recent_ranking() {
        let engine = RankingEngine::new();
        let mut older = item("older", 0, 0, 0, 0);
        older.publish_time = base_time() - Duration::days(3);
        let newer = item("newer", 0, 0, 0, 0);
        let ranked = engine.rank_at(vec![older, newer], SortBy::Recent, true, base_time());
        assert_eq!(ids(&ranked), vec!["newer", "older"]);
    }

    #[test]
    fn test_trending_favors_fresh_engagement() {
        let engine = RankingEngine::new();
        // 100 likes today beats 150 likes from ten days ago.
        let fresh = item("fresh", 100, 0, 0, 0);
        let mut stale = item("stale", 150, 0, 0, 0);
        stale.publish_time = base_time() - Duration::days(10);
        let ranked = engine.rank_at(vec![stale, fresh], SortBy::Trending, true, base_time());
        assert_eq!(ids(&ranked), vec!["fresh", "stale"]);
    }

    #[test]
    fn test_trend_score_published_today_has_denominator_one() {
        let i = item("today", 42, 8, 0, 0);
        let score = RankingEngine::trend_score(&i, base_time());
        assert!((score - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_trend_score_future_publish_never_divides_by_zero() {
        let mut i = item("future", 10, 0, 0, 0);
        i.publish_time = base_time() + Duration::days(5);
        let score = RankingEngine::trend_score(&i, base_time());
        assert!(score.is_finite());
        assert!((score - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_popular_missing_views_sort_last() {
        let engine = RankingEngine::new();
        let mut viewed = item("viewed", 0, 0, 0, 0);
        viewed.views = Some(1);
        let unviewed = item("unviewed", 100, 100, 0, 0);
        let ranked = engine.rank_at(vec![unviewed, viewed], SortBy::Popular, true, base_time());
        assert_eq!(ids(&ranked), vec!["viewed", "unviewed"]);
    }

    #[test]
    fn test_shares_uses_repost_alias() {
        let engine = RankingEngine::new();
        let mut reposted = item("reposted", 0, 0, 0, 0);
        reposted.reposts = Some(30);
        let shared = item("shared", 0, 0, 10, 0);
        let ranked = engine.rank_at(vec![shared, reposted], SortBy::Shares, true, base_time());
        assert_eq!(ids(&ranked), vec!["reposted", "shared"]);
    }

    #[test]
    fn test_relevant_without_query_falls_back_to_recent() {
        let engine = RankingEngine::new();
        let mut older = item("older", 999, 0, 0, 0);
        older.publish_time = base_time() - Duration::days(1);
        let newer = item("newer", 0, 0, 0, 0);
        let by_relevant = engine.rank_at(
            vec![older.clone(), newer.clone()],
            SortBy::Relevant,
            true,
            base_time(),
        );
        let by_recent = engine.rank_at(vec![older, newer], SortBy::Recent, true, base_time());
        assert_eq!(ids(&by_relevant), ids(&by_recent));
    }

    #[test]
    fn test_ascending_order() {
        let engine = RankingEngine::new();
        let items = vec![item("big", 100, 0, 0, 0), item("small", 1, 0, 0, 0)];
        let ranked = engine.rank_at(items, SortBy::Likes, false, base_time());
        assert_eq!(ids(&ranked), vec!["small", "big"]);
    }

    #[test]
    fn test_relevance_title_only_is_exactly_ten() {
        let engine = RankingEngine::new();
        let mut i = item("titled", 0, 0, 0, 0);
        i.title = Some("Rust tips and tricks".to_string());
        i.body = "nothing relevant here".to_string();
        let score = engine.relevance_score(&i, "rust");
        assert!((score - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_relevance_all_fields_plus_capped_boost() {
        let engine = RankingEngine::new();
        let mut i = item("full", 100_000, 0, 0, 0);
        i.title = Some("rust".to_string());
        i.body = "rust".to_string();
        i.tags = vec!["rust".to_string()];
        // 10 + 5 + 3 + capped boost of 5.
        let score = engine.relevance_score(&i, "rust");
        assert!((score - 23.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_relevance_boost_below_cap() {
        let engine = RankingEngine::new();
        let i = item("boosted", 2000, 0, 0, 0);
        let score = engine.relevance_score(&i, "no-match-term");
        assert!((score - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_relevance_is_case_insensitive() {
        let engine = RankingEngine::new();
        let mut i = item("cased", 0, 0, 0, 0);
        i.title = Some("Budget TRAVEL Guide".to_string());
        i.body = String::new();
        assert!((engine.relevance_score(&i, "travel") - 10.0).abs() < f64::EPSILON);
    }
}

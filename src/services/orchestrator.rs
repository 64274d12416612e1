//! Query orchestration.
//!
//! Ties the pipeline together: resolve the time window, fetch a snapshot
//! from the store, filter in memory, rank, paginate, and wrap the whole
//! thing in the cache-aside layer. The store does only coarse filtering
//! (window, platform, LIKE prefilter); everything finer happens here so
//! backends stay simple.

use crate::config::EngineConfig;
use crate::models::{
    AggregationReport, ContentItem, ContentQuery, QueryResponse, QueryStats, ScoredItem,
    SearchResponse, SortBy, TimeWindow,
};
use crate::observability::{current_request_id, enter_request_context};
use crate::services::aggregation::AggregationEngine;
use crate::services::cache::QueryCache;
use crate::services::export::{ExportFormat, ExportResult, export_items};
use crate::services::ranking::RankingEngine;
use crate::services::time_window::resolve_window;
use crate::storage::ContentStore;
use crate::{Error, Result};
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Number of top authors included in query statistics.
const STATS_TOP_AUTHORS: usize = 10;

/// Coordinates window resolution, storage, filtering, ranking, aggregation
/// and caching for content queries.
#[derive(Clone)]
pub struct QueryOrchestrator {
    store: Arc<dyn ContentStore>,
    cache: QueryCache,
    config: EngineConfig,
    ranking: RankingEngine,
    aggregation: AggregationEngine,
}

impl std::fmt::Debug for QueryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryOrchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl QueryOrchestrator {
    /// Creates an orchestrator over the given store and cache.
    #[must_use]
    pub fn new(store: Arc<dyn ContentStore>, cache: QueryCache, config: EngineConfig) -> Self {
        let aggregation =
            AggregationEngine::new().with_author_bucket_limit(config.author_bucket_limit);
        Self {
            store,
            cache,
            config,
            ranking: RankingEngine::new(),
            aggregation,
        }
    }

    /// Runs a historical content query through the cache-aside layer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the content store fails.
    /// Cache failures never surface; they degrade to a direct computation.
    #[instrument(skip(self, query), fields(time_range = %query.time_range, sort = query.sort_by.as_str()))]
    pub fn query(&self, query: &ContentQuery) -> Result<QueryResponse> {
        let _ctx = enter_request_context();
        let started = Instant::now();
        counter!("mediapulse_queries_total").increment(1);

        let response = self.cache.get_or_compute(
            &query.cache_key(),
            self.config.cache_ttl_secs,
            || self.execute_query(query),
        )?;

        histogram!("mediapulse_query_duration_seconds").record(started.elapsed().as_secs_f64());
        info!(
            request_id = current_request_id().as_deref().unwrap_or(""),
            total = response.total,
            returned = response.items.len(),
            "Query served"
        );
        Ok(response)
    }

    /// Runs a full-text search with relevance scoring.
    ///
    /// With [`SortBy::Relevant`] results order by score; any other criterion
    /// keeps its usual ordering and scores ride along as metadata.
    ///
    /// Never cached: search result sets are too diverse for the hit rate to
    /// pay for the cache churn.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the content store fails.
    #[instrument(skip(self, query), fields(time_range = %query.time_range))]
    pub fn search(&self, query: &ContentQuery) -> Result<SearchResponse> {
        let _ctx = enter_request_context();
        counter!("mediapulse_searches_total").increment(1);

        let text = query.search_text.as_deref().unwrap_or_default().trim().to_string();
        let window = resolve_window(&query.time_range);

        // Tag-only matches would be lost to the store's title/body
        // prefilter, so search fetches unfiltered and scores in memory.
        let snapshot = self.store.fetch(
            &window,
            query.platforms.as_deref(),
            None,
            self.config.query_fetch_limit,
        )?;

        let matched: Vec<ContentItem> = apply_filters(snapshot, query, &window)
            .into_iter()
            .filter(|item| text.is_empty() || self.ranking.relevance_score(item, &text) > 0.0)
            .collect();

        let score = |item: ContentItem| {
            let relevance_score = self.ranking.relevance_score(&item, &text);
            ScoredItem { item, relevance_score }
        };

        let ordered: Vec<ScoredItem> = if query.sort_by == SortBy::Relevant {
            let mut scored: Vec<ScoredItem> = matched.into_iter().map(score).collect();
            scored.sort_by(|a, b| {
                let ord = a
                    .relevance_score
                    .partial_cmp(&b.relevance_score)
                    .unwrap_or(std::cmp::Ordering::Equal);
                if query.sort_desc { ord.reverse() } else { ord }
            });
            scored
        } else {
            // Other criteria keep their usual ordering; scores come along
            // as metadata.
            self.ranking
                .rank(matched, query.sort_by, query.sort_desc)
                .into_iter()
                .map(score)
                .collect()
        };

        let total = ordered.len();
        let max_relevance = ordered
            .iter()
            .map(|s| s.relevance_score)
            .fold(0.0, f64::max);
        let page = paginate(ordered, self.config.clamp_limit(query.limit), query.offset);

        info!(
            request_id = current_request_id().as_deref().unwrap_or(""),
            total,
            returned = page.len(),
            "Search served"
        );
        Ok(SearchResponse {
            items: page,
            total,
            max_relevance,
        })
    }

    /// Buckets matching items along the query's aggregation dimension.
    ///
    /// Cached alongside regular queries: the dimension is part of the
    /// serialized query, so keys never collide with item queries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDimension`] when the query carries no
    /// dimension, or [`Error::StoreUnavailable`] if the store fails.
    #[instrument(skip(self, query), fields(time_range = %query.time_range))]
    pub fn aggregate(&self, query: &ContentQuery) -> Result<AggregationReport> {
        let _ctx = enter_request_context();
        let dimension = query
            .aggregate_by
            .ok_or_else(|| Error::UnsupportedDimension("none".to_string()))?;
        counter!("mediapulse_aggregations_total").increment(1);

        self.cache.get_or_compute(&query.cache_key(), self.config.cache_ttl_secs, || {
            let window = resolve_window(&query.time_range);
            let snapshot = self.store.fetch(
                &window,
                query.platforms.as_deref(),
                query.search_text.as_deref(),
                self.config.aggregation_fetch_limit,
            )?;
            let items = apply_filters(snapshot, query, &window);
            Ok(self.aggregation.aggregate(&items, dimension))
        })
    }

    /// Runs a query and serializes the resulting page for download.
    ///
    /// Data is returned inline; persisting large payloads to blob storage
    /// is the embedding service's concern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the content store fails, or
    /// [`Error::ExportFailed`] if serialization fails.
    #[instrument(skip(self, query, fields), fields(format = format.as_str()))]
    pub fn export(
        &self,
        query: &ContentQuery,
        format: ExportFormat,
        fields: Option<&[String]>,
    ) -> Result<ExportResult> {
        let response = self.query(query)?;
        counter!("mediapulse_exports_total").increment(1);
        let data = export_items(&response.items, format, fields)?;
        Ok(ExportResult {
            total_records: response.items.len(),
            data,
        })
    }

    /// Filters, ranks and paginates an in-memory batch without touching
    /// the store or the cache. This is the live-crawl path: freshly crawled
    /// items get the same ranking treatment as historical ones, but results
    /// must reflect exactly the batch passed in.
    #[must_use]
    pub fn post_process(&self, items: Vec<ContentItem>, query: &ContentQuery) -> QueryResponse {
        let window = resolve_window(&query.time_range);
        let matched = apply_filters(items, query, &window);
        self.assemble(matched, query)
    }

    fn execute_query(&self, query: &ContentQuery) -> Result<QueryResponse> {
        let window = resolve_window(&query.time_range);
        // Snapshot is capped at query_fetch_limit newest rows; `total`
        // counts matches within the snapshot.
        let snapshot = self.store.fetch(
            &window,
            query.platforms.as_deref(),
            query.search_text.as_deref(),
            self.config.query_fetch_limit,
        )?;
        let matched = apply_filters(snapshot, query, &window);
        Ok(self.assemble(matched, query))
    }

    /// Ranks, paginates and optionally summarizes an already-filtered set.
    fn assemble(&self, matched: Vec<ContentItem>, query: &ContentQuery) -> QueryResponse {
        let ranked = self.ranking.rank(matched, query.sort_by, query.sort_desc);
        let total = ranked.len();
        let stats = query.include_stats.then(|| self.compute_stats(&ranked));
        let items = paginate(ranked, self.config.clamp_limit(query.limit), query.offset);
        QueryResponse { items, total, stats }
    }

    /// Statistics over the full (pre-pagination) match set.
    #[allow(clippy::cast_precision_loss)]
    fn compute_stats(&self, items: &[ContentItem]) -> QueryStats {
        let total_items = items.len();
        let total_engagement: u64 = items.iter().map(ContentItem::total_engagement).sum();
        let average_engagement = if total_items == 0 {
            0.0
        } else {
            total_engagement as f64 / total_items as f64
        };

        let platform_distribution = self
            .aggregation
            .aggregate(items, crate::models::AggregateDimension::Platform)
            .buckets;
        let mut top_authors = self
            .aggregation
            .aggregate(items, crate::models::AggregateDimension::Author)
            .buckets;
        top_authors.truncate(STATS_TOP_AUTHORS);

        QueryStats {
            total_items,
            total_engagement,
            average_engagement,
            platform_distribution,
            top_authors,
        }
    }
}

/// In-memory filters the store cannot (or should not) apply.
fn apply_filters(
    items: Vec<ContentItem>,
    query: &ContentQuery,
    window: &TimeWindow,
) -> Vec<ContentItem> {
    items
        .into_iter()
        .filter(|item| window.contains(item.publish_time))
        .filter(|item| {
            let engagement = item.total_engagement();
            query.min_engagement.is_none_or(|min| engagement >= min)
                && query.max_engagement.is_none_or(|max| engagement <= max)
        })
        .filter(|item| {
            query
                .authors
                .as_ref()
                .is_none_or(|authors| authors.iter().any(|a| a == &item.author))
        })
        .filter(|item| {
            query.tags.as_ref().is_none_or(|tags| {
                tags.iter()
                    .any(|wanted| item.tags.iter().any(|t| t.eq_ignore_ascii_case(wanted)))
            })
        })
        .filter(|item| {
            query
                .search_text
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .is_none_or(|text| matches_keyword(item, text))
        })
        .collect()
}

/// Case-insensitive keyword match over title, body and tags.
fn matches_keyword(item: &ContentItem, text: &str) -> bool {
    let needle = text.to_lowercase();
    item.title
        .as_ref()
        .is_some_and(|t| t.to_lowercase().contains(&needle))
        || item.body.to_lowercase().contains(&needle)
        || item.tags.iter().any(|t| t.to_lowercase().contains(&needle))
}

fn paginate<T>(items: Vec<T>, limit: usize, offset: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}

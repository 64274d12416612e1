//! End-to-end tests for the query pipeline: SQLite store, cache-aside
//! layer, orchestrator and retention working together.
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::too_many_lines,
    clippy::cast_precision_loss
)]

use chrono::{Duration, Utc};
use mediapulse::gc::RetentionManager;
use mediapulse::models::{AggregateDimension, ContentId, ContentItem, Platform, SortBy};
use mediapulse::services::QueryCache;
use mediapulse::storage::{CacheStore, ContentStore, MemoryCacheStore, SqliteContentStore};
use mediapulse::{
    ContentQuery, EngineConfig, ExportFormat, QueryOrchestrator, Result, TimeWindow,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn item(id: &str, platform: Platform, likes: u64, days_ago: i64) -> ContentItem {
    ContentItem {
        id: ContentId::new(id),
        platform,
        title: Some(format!("post {id}")),
        body: format!("body of {id}"),
        url: format!("https://example.com/{id}"),
        likes,
        collects: 0,
        comments: 0,
        shares: 0,
        views: None,
        reposts: None,
        author: "alice".to_string(),
        author_id: "alice-1".to_string(),
        publish_time: Utc::now() - Duration::days(days_ago),
        crawl_time: Utc::now(),
        tags: vec!["daily".to_string()],
    }
}

/// Store decorator that counts fetches, for cache behavior assertions.
struct CountingStore {
    inner: SqliteContentStore,
    fetches: AtomicUsize,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: SqliteContentStore::in_memory().unwrap(),
            fetches: AtomicUsize::new(0),
        }
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl ContentStore for CountingStore {
    fn insert(&self, item: &ContentItem) -> Result<()> {
        self.inner.insert(item)
    }

    fn get(&self, platform: Platform, id: &ContentId) -> Result<Option<ContentItem>> {
        self.inner.get(platform, id)
    }

    fn fetch(
        &self,
        window: &TimeWindow,
        platforms: Option<&[Platform]>,
        search_text: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(window, platforms, search_text, limit)
    }

    fn count_older_than(
        &self,
        cutoff: chrono::DateTime<Utc>,
        platforms: Option<&[Platform]>,
    ) -> Result<u64> {
        self.inner.count_older_than(cutoff, platforms)
    }

    fn delete_older_than(
        &self,
        cutoff: chrono::DateTime<Utc>,
        platforms: Option<&[Platform]>,
    ) -> Result<u64> {
        self.inner.delete_older_than(cutoff, platforms)
    }
}

/// Cache store whose every operation fails.
struct BrokenCacheStore;

impl CacheStore for BrokenCacheStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(mediapulse::Error::StoreUnavailable {
            operation: "get".to_string(),
            cause: "cache offline".to_string(),
        })
    }

    fn set(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<()> {
        Err(mediapulse::Error::StoreUnavailable {
            operation: "set".to_string(),
            cause: "cache offline".to_string(),
        })
    }

    fn delete_prefix(&self, _prefix: &str) -> Result<u64> {
        Err(mediapulse::Error::StoreUnavailable {
            operation: "delete_prefix".to_string(),
            cause: "cache offline".to_string(),
        })
    }
}

#[test]
fn test_full_query_pipeline() {
    let store = Arc::new(SqliteContentStore::in_memory().unwrap());
    let cache = QueryCache::new(Arc::new(MemoryCacheStore::new()));
    let orch = QueryOrchestrator::new(store.clone(), cache, EngineConfig::default());

    store
        .insert_many(&[
            item("w1", Platform::Weibo, 100, 1),
            item("w2", Platform::Weibo, 10, 2),
            item("x1", Platform::Xiaohongshu, 50, 3),
            item("d1", Platform::Douyin, 75, 4),
            item("ancient", Platform::Weibo, 9999, 400),
        ])
        .unwrap();

    let q = ContentQuery::new()
        .with_time_range("7d")
        .with_sort(SortBy::Hot, true)
        .with_pagination(3, 0);
    let response = orch.query(&q).unwrap();

    assert_eq!(response.total, 4);
    assert_eq!(response.items.len(), 3);
    let ids: Vec<&str> = response.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["w1", "d1", "x1"]);
}

#[test]
fn test_identical_queries_compute_once_within_ttl() {
    let store = Arc::new(CountingStore::new());
    let cache = QueryCache::new(Arc::new(MemoryCacheStore::new()));
    let orch = QueryOrchestrator::new(store.clone(), cache, EngineConfig::default());

    store.insert(&item("a", Platform::Weibo, 5, 1)).unwrap();

    let q = ContentQuery::new().with_time_range("30d");
    orch.query(&q).unwrap();
    orch.query(&q).unwrap();
    orch.query(&q).unwrap();

    assert_eq!(store.fetch_count(), 1);
}

#[test]
fn test_expired_cache_recomputes() {
    let store = Arc::new(CountingStore::new());
    let cache = QueryCache::new(Arc::new(MemoryCacheStore::new()));
    // TTL 0 expires entries immediately.
    let config = EngineConfig::default().with_cache_ttl_secs(0);
    let orch = QueryOrchestrator::new(store.clone(), cache, config);

    store.insert(&item("a", Platform::Weibo, 5, 1)).unwrap();

    let q = ContentQuery::new().with_time_range("30d");
    orch.query(&q).unwrap();
    orch.query(&q).unwrap();

    assert_eq!(store.fetch_count(), 2);
}

#[test]
fn test_distinct_queries_do_not_share_cache_entries() {
    let store = Arc::new(CountingStore::new());
    let cache = QueryCache::new(Arc::new(MemoryCacheStore::new()));
    let orch = QueryOrchestrator::new(store.clone(), cache, EngineConfig::default());

    store.insert(&item("a", Platform::Weibo, 5, 1)).unwrap();

    orch.query(&ContentQuery::new().with_time_range("all")).unwrap();
    orch.query(&ContentQuery::new().with_time_range("all").with_pagination(10, 0))
        .unwrap();

    assert_eq!(store.fetch_count(), 2);
}

#[test]
fn test_broken_cache_never_fails_queries() {
    let store = Arc::new(SqliteContentStore::in_memory().unwrap());
    let cache = QueryCache::new(Arc::new(BrokenCacheStore));
    let orch = QueryOrchestrator::new(store.clone(), cache, EngineConfig::default());

    store.insert(&item("a", Platform::Weibo, 5, 1)).unwrap();

    let response = orch.query(&ContentQuery::new().with_time_range("7d")).unwrap();
    assert_eq!(response.total, 1);
}

#[test]
fn test_retention_invalidates_cached_responses() {
    let store = Arc::new(SqliteContentStore::in_memory().unwrap());
    let cache_store = Arc::new(MemoryCacheStore::new());
    let cache = QueryCache::new(cache_store.clone());
    let orch = QueryOrchestrator::new(store.clone(), cache.clone(), EngineConfig::default());
    let retention = RetentionManager::new(store.clone(), cache);

    store
        .insert_many(&[
            item("old", Platform::Weibo, 10, 400),
            item("fresh", Platform::Weibo, 10, 1),
        ])
        .unwrap();

    let q = ContentQuery::new().with_time_range("all");
    assert_eq!(orch.query(&q).unwrap().total, 2);

    // Dry run previews without changing anything.
    let preview = retention
        .cleanup(Utc::now() - Duration::days(365), None, true)
        .unwrap();
    assert_eq!(preview.deleted_count, 1);
    assert_eq!(orch.query(&q).unwrap().total, 2);

    // Real run deletes and invalidates, so the next query sees fresh data.
    let applied = retention
        .cleanup(Utc::now() - Duration::days(365), None, false)
        .unwrap();
    assert_eq!(applied.deleted_count, preview.deleted_count);
    assert_eq!(orch.query(&q).unwrap().total, 1);
    assert_eq!(orch.query(&q).unwrap().items[0].id.as_str(), "fresh");
}

#[test]
fn test_search_pipeline() {
    let store = Arc::new(SqliteContentStore::in_memory().unwrap());
    let cache = QueryCache::new(Arc::new(MemoryCacheStore::new()));
    let orch = QueryOrchestrator::new(store.clone(), cache, EngineConfig::default());

    let mut hit = item("hit", Platform::Xiaohongshu, 2000, 1);
    hit.title = Some("weekend travel vlog".to_string());
    let mut miss = item("miss", Platform::Xiaohongshu, 0, 1);
    miss.title = Some("cooking at home".to_string());
    miss.body = "pasta recipe".to_string();
    miss.tags = Vec::new();
    store.insert_many(&[hit, miss]).unwrap();

    let response = orch
        .search(
            &ContentQuery::new()
                .with_search_text("travel")
                .with_sort(SortBy::Relevant, true),
        )
        .unwrap();
    assert_eq!(response.total, 1);
    assert_eq!(response.items[0].item.id.as_str(), "hit");
    // Title match (10) plus engagement boost (2000 / 1000 = 2).
    assert!((response.max_relevance - 12.0).abs() < f64::EPSILON);
}

#[test]
fn test_aggregation_pipeline() {
    let store = Arc::new(SqliteContentStore::in_memory().unwrap());
    let cache = QueryCache::new(Arc::new(MemoryCacheStore::new()));
    let orch = QueryOrchestrator::new(store.clone(), cache, EngineConfig::default());

    store
        .insert_many(&[
            item("w1", Platform::Weibo, 5, 1),
            item("w2", Platform::Weibo, 3, 1),
            item("d1", Platform::Douyin, 10, 1),
        ])
        .unwrap();

    let q = ContentQuery::new().with_aggregation(AggregateDimension::Platform);
    let report = orch.aggregate(&q).unwrap();

    assert_eq!(report.buckets.len(), 2);
    assert_eq!(report.buckets[0].key, "douyin");
    assert_eq!(report.buckets[0].total_engagement, 10);
    assert_eq!(report.buckets[1].key, "weibo");
    assert_eq!(report.buckets[1].count, 2);
    assert_eq!(report.summary.total_count, 3);
    assert_eq!(report.summary.total_engagement, 18);
}

#[test]
fn test_export_pipeline() {
    let store = Arc::new(SqliteContentStore::in_memory().unwrap());
    let cache = QueryCache::new(Arc::new(MemoryCacheStore::new()));
    let orch = QueryOrchestrator::new(store.clone(), cache, EngineConfig::default());

    store
        .insert_many(&[
            item("w1", Platform::Weibo, 100, 1),
            item("d1", Platform::Douyin, 50, 2),
        ])
        .unwrap();

    let q = ContentQuery::new().with_sort(SortBy::Hot, true);
    let fields = vec!["id".to_string(), "platform".to_string(), "likes".to_string()];
    let result = orch.export(&q, ExportFormat::Csv, Some(&fields)).unwrap();

    assert_eq!(result.total_records, 2);
    let lines: Vec<&str> = result.data.lines().collect();
    assert_eq!(lines[0], "id,platform,likes");
    assert_eq!(lines[1], "w1,weibo,100");
    assert_eq!(lines[2], "d1,douyin,50");
}

#[test]
fn test_live_batch_post_processing_round_trip() {
    let store = Arc::new(SqliteContentStore::in_memory().unwrap());
    let cache = QueryCache::new(Arc::new(MemoryCacheStore::new()));
    let orch = QueryOrchestrator::new(store, cache, EngineConfig::default());

    let batch = vec![
        item("live-a", Platform::Douyin, 1, 0),
        item("live-b", Platform::Douyin, 100, 0),
        item("live-c", Platform::Douyin, 50, 0),
    ];
    let q = ContentQuery::new()
        .with_sort(SortBy::Hot, true)
        .with_pagination(2, 0)
        .with_stats();
    let response = orch.post_process(batch, &q);

    assert_eq!(response.total, 3);
    assert_eq!(response.items[0].id.as_str(), "live-b");
    let stats = response.stats.unwrap();
    assert_eq!(stats.total_items, 3);
    assert_eq!(stats.total_engagement, 151);
}

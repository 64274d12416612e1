//! SQLite-backed content store.
//!
//! Single connection behind a `Mutex`; WAL mode keeps readers from blocking
//! the writer in multi-process setups. Timestamps are stored as unix seconds
//! and tags as a JSON array in a TEXT column.

use crate::models::{ContentId, ContentItem, Platform, TimeWindow};
use crate::storage::ContentStore;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, ToSql, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS content_items (
    id            TEXT NOT NULL,
    platform      TEXT NOT NULL,
    title         TEXT,
    body          TEXT NOT NULL,
    url           TEXT NOT NULL,
    likes         INTEGER NOT NULL DEFAULT 0,
    collects      INTEGER NOT NULL DEFAULT 0,
    comments      INTEGER NOT NULL DEFAULT 0,
    shares        INTEGER NOT NULL DEFAULT 0,
    views         INTEGER,
    reposts       INTEGER,
    author        TEXT NOT NULL,
    author_id     TEXT NOT NULL,
    publish_time  INTEGER NOT NULL,
    crawl_time    INTEGER NOT NULL,
    tags          TEXT NOT NULL DEFAULT '[]',
    PRIMARY KEY (platform, id)
);
CREATE INDEX IF NOT EXISTS idx_content_publish_time ON content_items(publish_time);
CREATE INDEX IF NOT EXISTS idx_content_platform ON content_items(platform);
";

const SELECT_COLUMNS: &str = "id, platform, title, body, url, likes, collects, comments, shares, \
     views, reposts, author, author_id, publish_time, crawl_time, tags";

/// [`ContentStore`] backed by a SQLite database.
pub struct SqliteContentStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteContentStore").finish_non_exhaustive()
    }
}

impl SqliteContentStore {
    /// Opens (or creates) a database at `path` with the default busy
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the database cannot be opened
    /// or migrated.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path).map_err(store_err("open"))?;
        Self::initialize(conn, DEFAULT_BUSY_TIMEOUT)
    }

    /// Opens a database with an explicit busy timeout, typically wired from
    /// `EngineConfig::store_timeout_secs`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the database cannot be opened
    /// or migrated.
    pub fn open_with_timeout<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path).map_err(store_err("open"))?;
        Self::initialize(conn, busy_timeout)
    }

    /// Opens an in-memory database, for tests and ephemeral use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the database cannot be
    /// created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(store_err("open"))?;
        Self::initialize(conn, DEFAULT_BUSY_TIMEOUT)
    }

    fn initialize(conn: Connection, busy_timeout: Duration) -> Result<Self> {
        conn.busy_timeout(busy_timeout).map_err(store_err("open"))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(store_err("open"))?;
        conn.execute_batch(SCHEMA).map_err(store_err("migrate"))?;
        debug!("Content store ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| Error::StoreUnavailable {
            operation: "lock".to_string(),
            cause: e.to_string(),
        })
    }
}

impl ContentStore for SqliteContentStore {
    fn insert(&self, item: &ContentItem) -> Result<()> {
        let conn = self.conn()?;
        insert_item(&conn, item)
    }

    fn insert_many(&self, items: &[ContentItem]) -> Result<()> {
        // One transaction per batch, under a single lock acquisition so a
        // concurrent writer can never interleave statements inside it. The
        // transaction rolls back on drop if any insert fails.
        let conn = self.conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(store_err("insert_many"))?;
        for item in items {
            insert_item(&tx, item)?;
        }
        tx.commit().map_err(store_err("insert_many"))
    }

    fn get(&self, platform: Platform, id: &ContentId) -> Result<Option<ContentItem>> {
        let conn = self.conn()?;
        let sql =
            format!("SELECT {SELECT_COLUMNS} FROM content_items WHERE platform = ?1 AND id = ?2");
        conn.query_row(&sql, params![platform.as_str(), id.as_str()], row_to_item)
            .optional()
            .map_err(store_err("get"))
    }

    fn fetch(
        &self,
        window: &TimeWindow,
        platforms: Option<&[Platform]>,
        search_text: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        let conn = self.conn()?;
        let mut sql = format!("SELECT {SELECT_COLUMNS} FROM content_items WHERE 1=1");
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(start) = window.start {
            sql.push_str(" AND publish_time >= ?");
            values.push(Box::new(start.timestamp()));
        }
        if let Some(end) = window.end {
            sql.push_str(" AND publish_time < ?");
            values.push(Box::new(end.timestamp()));
        }
        if let Some(platforms) = platforms.filter(|p| !p.is_empty()) {
            let placeholders = vec!["?"; platforms.len()].join(", ");
            sql.push_str(&format!(" AND platform IN ({placeholders})"));
            for platform in platforms {
                values.push(Box::new(platform.as_str().to_string()));
            }
        }
        if let Some(text) = search_text.map(str::trim).filter(|t| !t.is_empty()) {
            // Coarse LIKE prefilter; exact scoring happens in memory.
            sql.push_str(" AND (title LIKE ? OR body LIKE ?)");
            let pattern = format!("%{text}%");
            values.push(Box::new(pattern.clone()));
            values.push(Box::new(pattern));
        }

        sql.push_str(" ORDER BY publish_time DESC LIMIT ?");
        values.push(Box::new(i64::try_from(limit).unwrap_or(i64::MAX)));

        let mut stmt = conn.prepare(&sql).map_err(store_err("fetch"))?;
        let rows = stmt
            .query_map(
                rusqlite::params_from_iter(values.iter().map(Box::as_ref)),
                row_to_item,
            )
            .map_err(store_err("fetch"))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row.map_err(store_err("fetch"))?);
        }
        Ok(items)
    }

    fn count_older_than(
        &self,
        cutoff: DateTime<Utc>,
        platforms: Option<&[Platform]>,
    ) -> Result<u64> {
        let conn = self.conn()?;
        let (clause, values) = platform_clause(cutoff, platforms);
        let sql = format!("SELECT COUNT(*) FROM content_items WHERE {clause}");
        let count: i64 = conn
            .query_row(
                &sql,
                rusqlite::params_from_iter(values.iter().map(Box::as_ref)),
                |row| row.get(0),
            )
            .map_err(store_err("count_older_than"))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn delete_older_than(
        &self,
        cutoff: DateTime<Utc>,
        platforms: Option<&[Platform]>,
    ) -> Result<u64> {
        let conn = self.conn()?;
        let (clause, values) = platform_clause(cutoff, platforms);
        let sql = format!("DELETE FROM content_items WHERE {clause}");
        let deleted = conn
            .execute(&sql, rusqlite::params_from_iter(values.iter().map(Box::as_ref)))
            .map_err(store_err("delete_older_than"))?;
        Ok(u64::try_from(deleted).unwrap_or(u64::MAX))
    }
}

/// Upsert shared by single inserts and batches; recrawled duplicates
/// replace in place.
fn insert_item(conn: &Connection, item: &ContentItem) -> Result<()> {
    let tags = serde_json::to_string(&item.tags).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "INSERT OR REPLACE INTO content_items \
         (id, platform, title, body, url, likes, collects, comments, shares, \
          views, reposts, author, author_id, publish_time, crawl_time, tags) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            item.id.as_str(),
            item.platform.as_str(),
            item.title,
            item.body,
            item.url,
            i64::try_from(item.likes).unwrap_or(i64::MAX),
            i64::try_from(item.collects).unwrap_or(i64::MAX),
            i64::try_from(item.comments).unwrap_or(i64::MAX),
            i64::try_from(item.shares).unwrap_or(i64::MAX),
            item.views.map(|v| i64::try_from(v).unwrap_or(i64::MAX)),
            item.reposts.map(|v| i64::try_from(v).unwrap_or(i64::MAX)),
            item.author,
            item.author_id,
            item.publish_time.timestamp(),
            item.crawl_time.timestamp(),
            tags,
        ],
    )
    .map_err(store_err("insert"))?;
    Ok(())
}

/// WHERE clause and parameters shared by retention count and delete, so the
/// dry run counts exactly what the real run would remove.
fn platform_clause(
    cutoff: DateTime<Utc>,
    platforms: Option<&[Platform]>,
) -> (String, Vec<Box<dyn ToSql>>) {
    let mut clause = String::from("publish_time < ?");
    let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(cutoff.timestamp())];
    if let Some(platforms) = platforms.filter(|p| !p.is_empty()) {
        let placeholders = vec!["?"; platforms.len()].join(", ");
        clause.push_str(&format!(" AND platform IN ({placeholders})"));
        for platform in platforms {
            values.push(Box::new(platform.as_str().to_string()));
        }
    }
    (clause, values)
}

fn store_err(operation: &'static str) -> impl Fn(rusqlite::Error) -> Error {
    move |e| Error::StoreUnavailable {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContentItem> {
    let platform_raw: String = row.get(1)?;
    let platform = Platform::parse(&platform_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown platform: {platform_raw}").into(),
        )
    })?;
    let tags_raw: String = row.get(15)?;

    Ok(ContentItem {
        id: ContentId::new(row.get::<_, String>(0)?),
        platform,
        title: row.get(2)?,
        body: row.get(3)?,
        url: row.get(4)?,
        likes: to_counter(row.get(5)?),
        collects: to_counter(row.get(6)?),
        comments: to_counter(row.get(7)?),
        shares: to_counter(row.get(8)?),
        views: row.get::<_, Option<i64>>(9)?.and_then(|v| u64::try_from(v).ok()),
        reposts: row.get::<_, Option<i64>>(10)?.and_then(|v| u64::try_from(v).ok()),
        author: row.get(11)?,
        author_id: row.get(12)?,
        publish_time: to_datetime(row.get(13)?),
        crawl_time: to_datetime(row.get(14)?),
        tags: serde_json::from_str(&tags_raw).unwrap_or_default(),
    })
}

fn to_counter(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

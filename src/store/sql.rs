// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQL durable store: the engagement ground truth.
//!
//! Holds the authoritative per-video counters, the `likes` /
//! `comment_likes` join rows, and the sampled `video_views` analytics
//! table. Reconciliation writes land here asynchronously; the read
//! paths fall back here on counter-store misses.
//!
//! Schema (engagement-relevant columns only; the wider catalog lives
//! with the host application):
//!
//! ```sql
//! CREATE TABLE videos (
//!   id TEXT PRIMARY KEY,
//!   title TEXT NOT NULL,
//!   description TEXT,
//!   tags TEXT,                -- lowercased, space-separated
//!   status TEXT NOT NULL,     -- DRAFT | PROCESSING | PUBLISHED | REMOVED
//!   views_count INTEGER NOT NULL DEFAULT 0,
//!   likes_count INTEGER NOT NULL DEFAULT 0,
//!   created_at INTEGER NOT NULL
//! )
//! ```
//!
//! ## sqlx `Any` driver
//!
//! Like the rest of the storage layer we use the `Any` driver so SQLite
//! works for tests and MySQL in production; those two are the supported
//! backends, since the driver does not translate `?` placeholders for
//! anything else. The tier-1 `similarity()` query only ever executes
//! when the startup capability probe passed on a backend exposing the
//! function.

use async_trait::async_trait;
use sqlx::{any::AnyPoolOptions, AnyPool, Row};
use std::sync::Once;
use std::time::Duration;

use super::traits::{
    CommentRecord, DurableStore, SampledView, StoreError, VideoRecord, VideoStatus,
};
use crate::resilience::retry::{retry, RetryConfig};
use crate::search::{SearchHit, SortMode};

// SQLx `Any` driver requires runtime installation
static INSTALL_DRIVERS: Once = Once::new();

fn install_drivers() {
    INSTALL_DRIVERS.call_once(|| {
        sqlx::any::install_default_drivers();
    });
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Dialect switches for the few statements the `Any` driver cannot
/// paper over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Sqlite,
    MySql,
}

impl Dialect {
    fn from_connection_string(connection_string: &str) -> Self {
        if connection_string.starts_with("sqlite:") {
            Dialect::Sqlite
        } else {
            Dialect::MySql
        }
    }
}

pub struct SqlDurableStore {
    pool: AnyPool,
    dialect: Dialect,
}

impl SqlDurableStore {
    /// Create a new durable store with startup-mode retry (fails fast if
    /// the connection string is wrong).
    pub async fn new(connection_string: &str) -> Result<Self, StoreError> {
        install_drivers();

        let dialect = Dialect::from_connection_string(connection_string);
        // In-memory SQLite is per-connection; more than one connection
        // would see an empty database.
        let max_connections = if connection_string.contains(":memory:") {
            1
        } else {
            20
        };

        let pool = retry("sql_connect", &RetryConfig::startup(), || async {
            AnyPoolOptions::new()
                .max_connections(max_connections)
                .acquire_timeout(Duration::from_secs(10))
                .idle_timeout(Duration::from_secs(300))
                .connect(connection_string)
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))
        })
        .await?;

        let store = Self { pool, dialect };
        store.init_schema().await?;
        Ok(store)
    }

    /// Get a clone of the connection pool for sharing.
    pub fn pool(&self) -> AnyPool {
        self.pool.clone()
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS videos (
                id VARCHAR(64) PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                tags TEXT,
                status VARCHAR(16) NOT NULL DEFAULT 'DRAFT',
                views_count BIGINT NOT NULL DEFAULT 0,
                likes_count BIGINT NOT NULL DEFAULT 0,
                created_at BIGINT NOT NULL DEFAULT 0
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id VARCHAR(64) PRIMARY KEY,
                video_id VARCHAR(64) NOT NULL,
                likes_count BIGINT NOT NULL DEFAULT 0
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS likes (
                user_id VARCHAR(64) NOT NULL,
                video_id VARCHAR(64) NOT NULL,
                created_at BIGINT NOT NULL,
                PRIMARY KEY (user_id, video_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS comment_likes (
                user_id VARCHAR(64) NOT NULL,
                comment_id VARCHAR(64) NOT NULL,
                created_at BIGINT NOT NULL,
                PRIMARY KEY (user_id, comment_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS video_views (
                video_id VARCHAR(64) NOT NULL,
                fingerprint VARCHAR(64) NOT NULL,
                user_agent TEXT,
                country VARCHAR(8),
                created_at BIGINT NOT NULL
            )
            "#,
        ];

        for sql in statements {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        Ok(())
    }

    fn parse_status(raw: &str) -> VideoStatus {
        match raw {
            "PUBLISHED" => VideoStatus::Published,
            "PROCESSING" => VideoStatus::Processing,
            "REMOVED" => VideoStatus::Removed,
            _ => VideoStatus::Draft,
        }
    }

    fn row_to_video(row: &sqlx::any::AnyRow) -> Result<VideoRecord, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let status: String = row
            .try_get("status")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let views_count: i64 = row
            .try_get("views_count")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let likes_count: i64 = row
            .try_get("likes_count")
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(VideoRecord {
            id,
            status: Self::parse_status(&status),
            views_count: views_count.max(0) as u64,
            likes_count,
        })
    }

    fn row_to_hit(row: &sqlx::any::AnyRow) -> Result<SearchHit, StoreError> {
        let video_id: String = row
            .try_get("id")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let title: String = row
            .try_get("title")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let views_count: i64 = row
            .try_get("views_count")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let created_at: i64 = row
            .try_get("created_at")
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(SearchHit {
            video_id,
            title,
            views_count: views_count.max(0) as u64,
            created_at,
        })
    }

    fn basic_order_clause(sort: SortMode) -> &'static str {
        match sort {
            SortMode::Relevance => "views_count DESC, created_at DESC",
            SortMode::Recent => "created_at DESC",
            SortMode::Popular => "views_count DESC",
        }
    }

    /// Seed a video row. Used by tests and catalog-import tooling; the
    /// host application owns video creation in production.
    pub async fn seed_video(
        &self,
        id: &str,
        title: &str,
        tags: &str,
        status: &str,
        views_count: i64,
        likes_count: i64,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO videos (id, title, description, tags, status, views_count, likes_count, created_at) \
             VALUES (?, ?, NULL, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(title)
        .bind(tags)
        .bind(status)
        .bind(views_count)
        .bind(likes_count)
        .bind(now_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    /// Seed a comment row. Same caveat as [`seed_video`](Self::seed_video).
    pub async fn seed_comment(&self, id: &str, video_id: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO comments (id, video_id, likes_count) VALUES (?, ?, 0)")
            .bind(id)
            .bind(video_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl DurableStore for SqlDurableStore {
    async fn find_video(&self, id: &str) -> Result<Option<VideoRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, status, views_count, likes_count FROM videos WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.map(|r| Self::row_to_video(&r)).transpose()
    }

    async fn find_videos(&self, ids: &[String]) -> Result<Vec<VideoRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, status, views_count, likes_count FROM videos WHERE id IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.iter().map(Self::row_to_video).collect()
    }

    async fn find_comment(&self, id: &str) -> Result<Option<CommentRecord>, StoreError> {
        let row = sqlx::query("SELECT id, likes_count FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.map(|r| {
            let id: String = r
                .try_get("id")
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            let likes_count: i64 = r
                .try_get("likes_count")
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            Ok(CommentRecord { id, likes_count })
        })
        .transpose()
    }

    async fn create_like(&self, user_id: &str, video_id: &str) -> Result<bool, StoreError> {
        // Reconciliation is at-least-once: a replayed insert must not fail
        // on the unique (user_id, video_id) pair. rows_affected tells the
        // caller whether this attempt actually created the row.
        let sql = match self.dialect {
            Dialect::Sqlite => {
                "INSERT OR IGNORE INTO likes (user_id, video_id, created_at) VALUES (?, ?, ?)"
            }
            Dialect::MySql => {
                "INSERT IGNORE INTO likes (user_id, video_id, created_at) VALUES (?, ?, ?)"
            }
        };

        let result = sqlx::query(sql)
            .bind(user_id)
            .bind(video_id)
            .bind(now_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_like(&self, user_id: &str, video_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = ? AND video_id = ?")
            .bind(user_id)
            .bind(video_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_comment_like(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> Result<bool, StoreError> {
        let sql = match self.dialect {
            Dialect::Sqlite => {
                "INSERT OR IGNORE INTO comment_likes (user_id, comment_id, created_at) \
                 VALUES (?, ?, ?)"
            }
            Dialect::MySql => {
                "INSERT IGNORE INTO comment_likes (user_id, comment_id, created_at) \
                 VALUES (?, ?, ?)"
            }
        };

        let result = sqlx::query(sql)
            .bind(user_id)
            .bind(comment_id)
            .bind(now_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_comment_like(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM comment_likes WHERE user_id = ? AND comment_id = ?")
            .bind(user_id)
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn has_like(&self, user_id: &str, video_id: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 AS x FROM likes WHERE user_id = ? AND video_id = ?")
            .bind(user_id)
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn has_comment_like(&self, user_id: &str, comment_id: &str) -> Result<bool, StoreError> {
        let row =
            sqlx::query("SELECT 1 AS x FROM comment_likes WHERE user_id = ? AND comment_id = ?")
                .bind(user_id)
                .bind(comment_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn adjust_video_likes(&self, video_id: &str, delta: i64) -> Result<(), StoreError> {
        // Clamp at zero in SQL: reconciliation replays must never drive
        // the authoritative count negative.
        let sql = if self.dialect == Dialect::Sqlite {
            "UPDATE videos SET likes_count = MAX(likes_count + ?, 0) WHERE id = ?"
        } else {
            "UPDATE videos SET likes_count = GREATEST(likes_count + ?, 0) WHERE id = ?"
        };

        sqlx::query(sql)
            .bind(delta)
            .bind(video_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn adjust_comment_likes(&self, comment_id: &str, delta: i64) -> Result<(), StoreError> {
        let sql = if self.dialect == Dialect::Sqlite {
            "UPDATE comments SET likes_count = MAX(likes_count + ?, 0) WHERE id = ?"
        } else {
            "UPDATE comments SET likes_count = GREATEST(likes_count + ?, 0) WHERE id = ?"
        };

        sqlx::query(sql)
            .bind(delta)
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn create_sampled_view(&self, view: &SampledView) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO video_views (video_id, fingerprint, user_agent, country, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&view.video_id)
        .bind(&view.fingerprint)
        .bind(&view.user_agent)
        .bind(&view.country)
        .bind(now_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn find_user_likes(
        &self,
        user_id: &str,
        video_ids: &[String],
    ) -> Result<Vec<String>, StoreError> {
        if video_ids.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = vec!["?"; video_ids.len()].join(", ");
        let sql = format!(
            "SELECT video_id FROM likes WHERE user_id = ? AND video_id IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&sql).bind(user_id);
        for id in video_ids {
            query = query.bind(id);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.iter()
            .map(|r| {
                r.try_get::<String, _>("video_id")
                    .map_err(|e| StoreError::Backend(e.to_string()))
            })
            .collect()
    }

    async fn supports_fuzzy_search(&self) -> bool {
        // One probe at startup; the extension either exists or it doesn't.
        sqlx::query("SELECT similarity('trigram', 'trigram') AS s")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    async fn search_videos_fuzzy(
        &self,
        query: &str,
        sort: SortMode,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let order = match sort {
            SortMode::Relevance => "relevance DESC, views_count DESC",
            SortMode::Recent => "created_at DESC",
            SortMode::Popular => "views_count DESC",
        };
        let sql = format!(
            "SELECT id, title, views_count, created_at, \
                    similarity(title, ?) AS relevance \
             FROM videos \
             WHERE status = 'PUBLISHED' \
               AND (title LIKE ? OR description LIKE ? OR similarity(title, ?) > 0.1) \
             ORDER BY {} LIMIT ? OFFSET ?",
            order
        );
        let pattern = format!("%{}%", query);

        let rows = sqlx::query(&sql)
            .bind(query)
            .bind(&pattern)
            .bind(&pattern)
            .bind(query)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.iter().map(Self::row_to_hit).collect()
    }

    async fn search_videos_basic(
        &self,
        query: &str,
        sort: SortMode,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let sql = format!(
            "SELECT id, title, views_count, created_at FROM videos \
             WHERE status = 'PUBLISHED' \
               AND (LOWER(title) LIKE ? OR LOWER(description) LIKE ? OR LOWER(tags) LIKE ?) \
             ORDER BY {} LIMIT ? OFFSET ?",
            Self::basic_order_clause(sort)
        );
        let pattern = format!("%{}%", query.to_lowercase());

        let rows = sqlx::query(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.iter().map(Self::row_to_hit).collect()
    }

    async fn title_suggestions(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        let pattern = format!("%{}%", prefix.to_lowercase());

        let rows = sqlx::query(
            "SELECT title FROM videos \
             WHERE status = 'PUBLISHED' AND LOWER(title) LIKE ? \
             ORDER BY views_count DESC LIMIT ?",
        )
        .bind(&pattern)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.iter()
            .map(|r| {
                r.try_get::<String, _>("title")
                    .map_err(|e| StoreError::Backend(e.to_string()))
            })
            .collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn sqlite_store() -> SqlDurableStore {
        SqlDurableStore::new("sqlite::memory:")
            .await
            .expect("sqlite store")
    }

    #[tokio::test]
    async fn test_find_video_roundtrip() {
        let store = sqlite_store().await;
        store
            .seed_video("v1", "First video", "tag", "PUBLISHED", 7, 3)
            .await
            .unwrap();

        let video = store.find_video("v1").await.unwrap().expect("video");
        assert_eq!(video.id, "v1");
        assert_eq!(video.status, VideoStatus::Published);
        assert_eq!(video.views_count, 7);
        assert_eq!(video.likes_count, 3);

        assert!(store.find_video("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_videos_batched() {
        let store = sqlite_store().await;
        store
            .seed_video("v1", "One", "", "PUBLISHED", 1, 0)
            .await
            .unwrap();
        store
            .seed_video("v2", "Two", "", "PUBLISHED", 2, 0)
            .await
            .unwrap();

        let found = store
            .find_videos(&["v1".into(), "v2".into(), "v3".into()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_create_like_is_idempotent() {
        let store = sqlite_store().await;
        store
            .seed_video("v1", "One", "", "PUBLISHED", 0, 0)
            .await
            .unwrap();

        assert!(store.create_like("u1", "v1").await.unwrap());
        // Replay: no row created, reported as unchanged
        assert!(!store.create_like("u1", "v1").await.unwrap());

        assert!(store.has_like("u1", "v1").await.unwrap());
        let liked = store
            .find_user_likes("u1", &["v1".into()])
            .await
            .unwrap();
        assert_eq!(liked, vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_like_missing_pair_is_ok() {
        let store = sqlite_store().await;
        assert!(!store.delete_like("u1", "v1").await.unwrap());
        assert!(!store.has_like("u1", "v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_adjust_video_likes_clamps_at_zero() {
        let store = sqlite_store().await;
        store
            .seed_video("v1", "One", "", "PUBLISHED", 0, 1)
            .await
            .unwrap();

        store.adjust_video_likes("v1", -5).await.unwrap();
        let video = store.find_video("v1").await.unwrap().unwrap();
        assert_eq!(video.likes_count, 0);

        store.adjust_video_likes("v1", 2).await.unwrap();
        let video = store.find_video("v1").await.unwrap().unwrap();
        assert_eq!(video.likes_count, 2);
    }

    #[tokio::test]
    async fn test_comment_like_roundtrip() {
        let store = sqlite_store().await;
        store
            .seed_video("v1", "One", "", "PUBLISHED", 0, 0)
            .await
            .unwrap();
        store.seed_comment("c1", "v1").await.unwrap();

        assert!(store.create_comment_like("u1", "c1").await.unwrap());
        store.adjust_comment_likes("c1", 1).await.unwrap();
        assert!(store.has_comment_like("u1", "c1").await.unwrap());

        let comment = store.find_comment("c1").await.unwrap().unwrap();
        assert_eq!(comment.likes_count, 1);

        assert!(store.delete_comment_like("u1", "c1").await.unwrap());
        assert!(!store.has_comment_like("u1", "c1").await.unwrap());
    }

    #[tokio::test]
    async fn test_sampled_view_insert() {
        let store = sqlite_store().await;
        store
            .seed_video("v1", "One", "", "PUBLISHED", 0, 0)
            .await
            .unwrap();

        let view = SampledView {
            video_id: "v1".into(),
            fingerprint: "ab".repeat(32),
            user_agent: Some("test-agent".into()),
            country: Some("GB".into()),
        };
        store.create_sampled_view(&view).await.unwrap();
    }

    #[tokio::test]
    async fn test_fuzzy_probe_fails_on_sqlite() {
        let store = sqlite_store().await;
        // SQLite has no similarity(); the cascade must land on tier 2.
        assert!(!store.supports_fuzzy_search().await);
    }

    #[tokio::test]
    async fn test_basic_search_excludes_unpublished() {
        let store = sqlite_store().await;
        store
            .seed_video("v1", "Climbing basics", "outdoor", "PUBLISHED", 10, 0)
            .await
            .unwrap();
        store
            .seed_video("v2", "Climbing draft", "outdoor", "DRAFT", 0, 0)
            .await
            .unwrap();

        let hits = store
            .search_videos_basic("climbing", SortMode::Relevance, 24, 0)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].video_id, "v1");
    }

    #[tokio::test]
    async fn test_basic_search_matches_tags() {
        let store = sqlite_store().await;
        store
            .seed_video("v1", "Some title", "bouldering crimp", "PUBLISHED", 1, 0)
            .await
            .unwrap();

        let hits = store
            .search_videos_basic("bouldering", SortMode::Popular, 24, 0)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_title_suggestions_ordered_by_views() {
        let store = sqlite_store().await;
        store
            .seed_video("v1", "Climbing basics", "", "PUBLISHED", 10, 0)
            .await
            .unwrap();
        store
            .seed_video("v2", "Climbing advanced", "", "PUBLISHED", 99, 0)
            .await
            .unwrap();

        let titles = store.title_suggestions("climbing", 5).await.unwrap();
        assert_eq!(titles[0], "Climbing advanced");
    }

    #[tokio::test]
    async fn test_ping() {
        let store = sqlite_store().await;
        store.ping().await.unwrap();
    }
}

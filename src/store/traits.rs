use async_trait::async_trait;
use thiserror::Error;

use crate::search::{SearchHit, SortMode};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Publication state of a video. Only published videos accrue engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoStatus {
    Draft,
    Processing,
    Published,
    Removed,
}

impl VideoStatus {
    #[must_use]
    pub fn is_published(self) -> bool {
        matches!(self, VideoStatus::Published)
    }
}

/// Authoritative video row, as read from the durable store.
#[derive(Debug, Clone)]
pub struct VideoRecord {
    pub id: String,
    pub status: VideoStatus,
    /// Authoritative view count. Fast-path counters may run ahead of this.
    pub views_count: u64,
    /// Authoritative like count, adjusted only by confirmed like row
    /// creation/deletion.
    pub likes_count: i64,
}

/// Comment row. Comments are likeable whenever they exist.
#[derive(Debug, Clone)]
pub struct CommentRecord {
    pub id: String,
    pub likes_count: i64,
}

/// Analytics row for a statistically sampled counted view.
///
/// Never used for the authoritative count; carries the hashed
/// fingerprint, never the raw address.
#[derive(Debug, Clone)]
pub struct SampledView {
    pub video_id: String,
    pub fingerprint: String,
    pub user_agent: Option<String>,
    pub country: Option<String>,
}

/// Fast-path counter store (Redis in production).
///
/// Every mutation here must be a single atomic store-native operation.
/// Correctness under concurrent callers depends on it: the application
/// layer never does read-modify-write against these keys.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increment a counter, returning the new value.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// Atomically decrement a counter, returning the new value.
    /// The stored value may go negative; readers clamp.
    async fn decr(&self, key: &str) -> Result<i64, StoreError>;

    /// Read a counter. `None` when the key does not exist.
    async fn get_count(&self, key: &str) -> Result<Option<i64>, StoreError>;

    /// Set a counter with a TTL (cache warming).
    async fn set_count(&self, key: &str, value: i64, ttl_secs: u64) -> Result<(), StoreError>;

    /// Atomically set a counter with a TTL only if the key is absent
    /// (cold-cache seeding). Returns true if the value was written.
    /// Must be a single store-native operation: concurrent seeders and
    /// incrementers must never lose an increment.
    async fn set_count_if_absent(
        &self,
        key: &str,
        value: i64,
        ttl_secs: u64,
    ) -> Result<bool, StoreError>;

    /// Pipelined multi-get of counters, same order as `keys`.
    async fn get_counts(&self, keys: &[String]) -> Result<Vec<Option<i64>>, StoreError>;

    /// Set an expiring marker key.
    async fn set_marker(&self, key: &str, ttl_secs: u64) -> Result<(), StoreError>;

    /// Check marker/key existence.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Refresh the TTL on a key. No-op if the key is missing.
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), StoreError>;

    /// Atomically add a member to a set. Returns true if newly added.
    async fn set_add(&self, set_key: &str, member: &str) -> Result<bool, StoreError>;

    /// Atomically remove a member from a set. Returns true if it was present.
    async fn set_remove(&self, set_key: &str, member: &str) -> Result<bool, StoreError>;

    /// Set membership check.
    async fn set_is_member(&self, set_key: &str, member: &str) -> Result<bool, StoreError>;

    /// Pipelined membership backfill (cache warmup).
    /// Default implementation falls back to sequential adds.
    async fn set_add_batch(&self, pairs: &[(String, String)]) -> Result<(), StoreError> {
        for (set_key, member) in pairs {
            self.set_add(set_key, member).await?;
        }
        Ok(())
    }

    /// Connectivity probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Durable relational store (SQL in production). Source of truth,
/// eventually consistent with the fast-path counters.
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn find_video(&self, id: &str) -> Result<Option<VideoRecord>, StoreError>;

    /// Batched lookup for the batch-read fallback: one query, not N.
    async fn find_videos(&self, ids: &[String]) -> Result<Vec<VideoRecord>, StoreError>;

    async fn find_comment(&self, id: &str) -> Result<Option<CommentRecord>, StoreError>;

    /// Insert a like row. Inserting an existing (user, video) pair is a
    /// no-op: reconciliation is at-least-once and must be idempotent.
    /// Returns true only when a row was actually created, so callers
    /// adjust the authoritative count on confirmed changes only.
    async fn create_like(&self, user_id: &str, video_id: &str) -> Result<bool, StoreError>;

    /// Delete a like row. Deleting a missing pair is a no-op. Returns
    /// true only when a row was actually deleted.
    async fn delete_like(&self, user_id: &str, video_id: &str) -> Result<bool, StoreError>;

    async fn create_comment_like(&self, user_id: &str, comment_id: &str)
        -> Result<bool, StoreError>;

    async fn delete_comment_like(&self, user_id: &str, comment_id: &str)
        -> Result<bool, StoreError>;

    /// Does a like row exist for this pair? Read-path fallback for the
    /// window before async reconciliation completes.
    async fn has_like(&self, user_id: &str, video_id: &str) -> Result<bool, StoreError>;

    async fn has_comment_like(&self, user_id: &str, comment_id: &str)
        -> Result<bool, StoreError>;

    /// Adjust the authoritative like count on a video by `delta`.
    async fn adjust_video_likes(&self, video_id: &str, delta: i64) -> Result<(), StoreError>;

    /// Adjust the authoritative like count on a comment by `delta`.
    async fn adjust_comment_likes(&self, comment_id: &str, delta: i64)
        -> Result<(), StoreError>;

    /// Persist a sampled-view analytics row.
    async fn create_sampled_view(&self, view: &SampledView) -> Result<(), StoreError>;

    /// Which of `video_ids` has this user liked? One bulk query,
    /// used by cache warmup to avoid N+1 lookups.
    async fn find_user_likes(
        &self,
        user_id: &str,
        video_ids: &[String],
    ) -> Result<Vec<String>, StoreError>;

    /// Is the similarity-ranked (trigram) query path available?
    /// Probed once at startup by the search cascade.
    async fn supports_fuzzy_search(&self) -> bool;

    /// Tier-1 search: trigram similarity plus substring match,
    /// published videos only, ordered per `sort`.
    async fn search_videos_fuzzy(
        &self,
        query: &str,
        sort: SortMode,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchHit>, StoreError>;

    /// Tier-2 search: case-insensitive substring/tag match,
    /// published videos only, ordered per `sort`.
    async fn search_videos_basic(
        &self,
        query: &str,
        sort: SortMode,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchHit>, StoreError>;

    /// Title suggestions for a partial query, most-viewed first.
    async fn title_suggestions(&self, prefix: &str, limit: usize)
        -> Result<Vec<String>, StoreError>;

    /// Connectivity probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory store implementations for tests and local development.
//!
//! [`MemoryCounterStore`] mirrors the Redis semantics the engine relies
//! on (atomic per-key mutation, lazy TTL expiry, set membership);
//! [`MemoryDurableStore`] mirrors the SQL semantics (idempotent like
//! rows, clamped counter adjustments, published-only search). Both can
//! be flipped into an "unavailable" mode to exercise fallback and
//! fail-closed paths.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use super::traits::{
    CommentRecord, CounterStore, DurableStore, SampledView, StoreError, VideoRecord, VideoStatus,
};
use crate::search::{SearchHit, SortMode};

#[derive(Debug, Default)]
struct CounterEntry {
    value: i64,
    expires_at: Option<Instant>,
}

impl CounterEntry {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

#[derive(Debug, Default)]
struct SetEntry {
    members: HashSet<String>,
    expires_at: Option<Instant>,
}

impl SetEntry {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-memory [`CounterStore`]. Expiry is lazy: expired entries read as
/// missing and are reset on the next write.
#[derive(Default)]
pub struct MemoryCounterStore {
    entries: DashMap<String, CounterEntry>,
    sets: DashMap<String, SetEntry>,
    unavailable: AtomicBool,
}

impl MemoryCounterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store offline".into()))
        } else {
            Ok(())
        }
    }

    fn incr_by(&self, key: &str, delta: i64) -> i64 {
        let mut entry = self.entries.entry(key.to_string()).or_default();
        if entry.expired() {
            entry.value = 0;
            entry.expires_at = None;
        }
        entry.value += delta;
        entry.value
    }

    fn ttl_instant(ttl_secs: u64) -> Option<Instant> {
        Instant::now().checked_add(std::time::Duration::from_secs(ttl_secs))
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.check_available()?;
        Ok(self.incr_by(key, 1))
    }

    async fn decr(&self, key: &str) -> Result<i64, StoreError> {
        self.check_available()?;
        Ok(self.incr_by(key, -1))
    }

    async fn get_count(&self, key: &str) -> Result<Option<i64>, StoreError> {
        self.check_available()?;
        Ok(self
            .entries
            .get(key)
            .filter(|e| !e.expired())
            .map(|e| e.value))
    }

    async fn set_count(&self, key: &str, value: i64, ttl_secs: u64) -> Result<(), StoreError> {
        self.check_available()?;
        self.entries.insert(
            key.to_string(),
            CounterEntry {
                value,
                expires_at: Self::ttl_instant(ttl_secs),
            },
        );
        Ok(())
    }

    async fn set_count_if_absent(
        &self,
        key: &str,
        value: i64,
        ttl_secs: u64,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        // The entry guard holds the shard lock, so the check and the
        // write are one atomic step, as with SET NX.
        match self.entries.entry(key.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                if occupied.get().expired() {
                    occupied.insert(CounterEntry {
                        value,
                        expires_at: Self::ttl_instant(ttl_secs),
                    });
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(CounterEntry {
                    value,
                    expires_at: Self::ttl_instant(ttl_secs),
                });
                Ok(true)
            }
        }
    }

    async fn get_counts(&self, keys: &[String]) -> Result<Vec<Option<i64>>, StoreError> {
        self.check_available()?;
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            out.push(
                self.entries
                    .get(key.as_str())
                    .filter(|e| !e.expired())
                    .map(|e| e.value),
            );
        }
        Ok(out)
    }

    async fn set_marker(&self, key: &str, ttl_secs: u64) -> Result<(), StoreError> {
        self.check_available()?;
        self.entries.insert(
            key.to_string(),
            CounterEntry {
                value: 1,
                expires_at: Self::ttl_instant(ttl_secs),
            },
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.entries.get(key).filter(|e| !e.expired()).is_some())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.entries.remove(key);
        self.sets.remove(key);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), StoreError> {
        self.check_available()?;
        if let Some(mut entry) = self.entries.get_mut(key) {
            if !entry.expired() {
                entry.expires_at = Self::ttl_instant(ttl_secs);
            }
        }
        if let Some(mut set) = self.sets.get_mut(key) {
            if !set.expired() {
                set.expires_at = Self::ttl_instant(ttl_secs);
            }
        }
        Ok(())
    }

    async fn set_add(&self, set_key: &str, member: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut set = self.sets.entry(set_key.to_string()).or_default();
        if set.expired() {
            set.members.clear();
            set.expires_at = None;
        }
        Ok(set.members.insert(member.to_string()))
    }

    async fn set_remove(&self, set_key: &str, member: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self
            .sets
            .get_mut(set_key)
            .filter(|s| !s.expired())
            .map(|mut s| s.members.remove(member))
            .unwrap_or(false))
    }

    async fn set_is_member(&self, set_key: &str, member: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self
            .sets
            .get(set_key)
            .filter(|s| !s.expired())
            .map(|s| s.members.contains(member))
            .unwrap_or(false))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

#[derive(Debug, Clone)]
struct VideoRow {
    id: String,
    title: String,
    tags: String,
    status: VideoStatus,
    views_count: u64,
    likes_count: i64,
    created_at: i64,
}

impl VideoRow {
    fn to_record(&self) -> VideoRecord {
        VideoRecord {
            id: self.id.clone(),
            status: self.status,
            views_count: self.views_count,
            likes_count: self.likes_count,
        }
    }

    fn to_hit(&self) -> SearchHit {
        SearchHit {
            video_id: self.id.clone(),
            title: self.title.clone(),
            views_count: self.views_count,
            created_at: self.created_at,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.tags.to_lowercase().contains(needle)
    }
}

/// In-memory [`DurableStore`].
#[derive(Default)]
pub struct MemoryDurableStore {
    videos: DashMap<String, VideoRow>,
    comments: DashMap<String, CommentRecord>,
    likes: DashMap<(String, String), ()>,
    comment_likes: DashMap<(String, String), ()>,
    sampled_views: Mutex<Vec<SampledView>>,
    fuzzy_supported: AtomicBool,
    unavailable: AtomicBool,
}

impl MemoryDurableStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Control what the fuzzy-capability probe reports.
    pub fn set_fuzzy_supported(&self, supported: bool) {
        self.fuzzy_supported.store(supported, Ordering::SeqCst);
    }

    pub fn seed_published_video(&self, id: &str, title: &str) {
        self.seed_published_video_at(id, title, 0, 0);
    }

    pub fn seed_published_video_at(&self, id: &str, title: &str, views: u64, created_at: i64) {
        self.videos.insert(
            id.to_string(),
            VideoRow {
                id: id.to_string(),
                title: title.to_string(),
                tags: String::new(),
                status: VideoStatus::Published,
                views_count: views,
                likes_count: 0,
                created_at,
            },
        );
    }

    pub fn seed_draft_video(&self, id: &str, title: &str) {
        self.videos.insert(
            id.to_string(),
            VideoRow {
                id: id.to_string(),
                title: title.to_string(),
                tags: String::new(),
                status: VideoStatus::Draft,
                views_count: 0,
                likes_count: 0,
                created_at: 0,
            },
        );
    }

    pub fn seed_comment(&self, id: &str) {
        self.comments.insert(
            id.to_string(),
            CommentRecord {
                id: id.to_string(),
                likes_count: 0,
            },
        );
    }

    /// Sampled analytics rows captured so far (test inspection).
    pub fn sampled_views(&self) -> Vec<SampledView> {
        self.sampled_views.lock().clone()
    }

    /// Number of like rows (test inspection).
    pub fn like_row_count(&self) -> usize {
        self.likes.len()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store offline".into()))
        } else {
            Ok(())
        }
    }

    fn search_rows(
        &self,
        query: &str,
        sort: SortMode,
        limit: usize,
        offset: usize,
    ) -> Vec<SearchHit> {
        let needle = query.to_lowercase();
        let mut rows: Vec<VideoRow> = self
            .videos
            .iter()
            .filter(|r| r.status.is_published() && r.matches(&needle))
            .map(|r| r.value().clone())
            .collect();

        match sort {
            SortMode::Relevance | SortMode::Popular => {
                rows.sort_by(|a, b| {
                    b.views_count
                        .cmp(&a.views_count)
                        .then(b.created_at.cmp(&a.created_at))
                });
            }
            SortMode::Recent => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }

        rows.iter()
            .skip(offset)
            .take(limit)
            .map(VideoRow::to_hit)
            .collect()
    }
}

#[async_trait]
impl DurableStore for MemoryDurableStore {
    async fn find_video(&self, id: &str) -> Result<Option<VideoRecord>, StoreError> {
        self.check_available()?;
        Ok(self.videos.get(id).map(|r| r.to_record()))
    }

    async fn find_videos(&self, ids: &[String]) -> Result<Vec<VideoRecord>, StoreError> {
        self.check_available()?;
        Ok(ids
            .iter()
            .filter_map(|id| self.videos.get(id.as_str()).map(|r| r.to_record()))
            .collect())
    }

    async fn find_comment(&self, id: &str) -> Result<Option<CommentRecord>, StoreError> {
        self.check_available()?;
        Ok(self.comments.get(id).map(|r| r.value().clone()))
    }

    async fn create_like(&self, user_id: &str, video_id: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self
            .likes
            .insert((user_id.to_string(), video_id.to_string()), ())
            .is_none())
    }

    async fn delete_like(&self, user_id: &str, video_id: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self
            .likes
            .remove(&(user_id.to_string(), video_id.to_string()))
            .is_some())
    }

    async fn create_comment_like(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self
            .comment_likes
            .insert((user_id.to_string(), comment_id.to_string()), ())
            .is_none())
    }

    async fn delete_comment_like(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self
            .comment_likes
            .remove(&(user_id.to_string(), comment_id.to_string()))
            .is_some())
    }

    async fn has_like(&self, user_id: &str, video_id: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self
            .likes
            .contains_key(&(user_id.to_string(), video_id.to_string())))
    }

    async fn has_comment_like(&self, user_id: &str, comment_id: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self
            .comment_likes
            .contains_key(&(user_id.to_string(), comment_id.to_string())))
    }

    async fn adjust_video_likes(&self, video_id: &str, delta: i64) -> Result<(), StoreError> {
        self.check_available()?;
        if let Some(mut row) = self.videos.get_mut(video_id) {
            row.likes_count = (row.likes_count + delta).max(0);
        }
        Ok(())
    }

    async fn adjust_comment_likes(&self, comment_id: &str, delta: i64) -> Result<(), StoreError> {
        self.check_available()?;
        if let Some(mut row) = self.comments.get_mut(comment_id) {
            row.likes_count = (row.likes_count + delta).max(0);
        }
        Ok(())
    }

    async fn create_sampled_view(&self, view: &SampledView) -> Result<(), StoreError> {
        self.check_available()?;
        self.sampled_views.lock().push(view.clone());
        Ok(())
    }

    async fn find_user_likes(
        &self,
        user_id: &str,
        video_ids: &[String],
    ) -> Result<Vec<String>, StoreError> {
        self.check_available()?;
        Ok(video_ids
            .iter()
            .filter(|id| {
                self.likes
                    .contains_key(&(user_id.to_string(), id.to_string()))
            })
            .cloned()
            .collect())
    }

    async fn supports_fuzzy_search(&self) -> bool {
        self.fuzzy_supported.load(Ordering::SeqCst)
    }

    async fn search_videos_fuzzy(
        &self,
        query: &str,
        sort: SortMode,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        self.check_available()?;
        // Test double: same matching as basic, distinguished by tier.
        Ok(self.search_rows(query, sort, limit, offset))
    }

    async fn search_videos_basic(
        &self,
        query: &str,
        sort: SortMode,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        self.check_available()?;
        Ok(self.search_rows(query, sort, limit, offset))
    }

    async fn title_suggestions(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        self.check_available()?;
        let needle = prefix.to_lowercase();
        let mut rows: Vec<VideoRow> = self
            .videos
            .iter()
            .filter(|r| r.status.is_published() && r.title.to_lowercase().contains(&needle))
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| b.views_count.cmp(&a.views_count));
        Ok(rows.into_iter().take(limit).map(|r| r.title).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counter_incr_decr() {
        let store = MemoryCounterStore::new();
        assert_eq!(store.incr("k").await.unwrap(), 1);
        assert_eq!(store.incr("k").await.unwrap(), 2);
        assert_eq!(store.decr("k").await.unwrap(), 1);
        assert_eq!(store.get_count("k").await.unwrap(), Some(1));
        assert_eq!(store.get_count("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_counter_batch_get_preserves_order() {
        let store = MemoryCounterStore::new();
        store.set_count("a", 10, 60).await.unwrap();
        store.set_count("c", 30, 60).await.unwrap();

        let values = store
            .get_counts(&["a".into(), "b".into(), "c".into()])
            .await
            .unwrap();
        assert_eq!(values, vec![Some(10), None, Some(30)]);
    }

    #[tokio::test]
    async fn test_set_count_if_absent_seeds_once() {
        let store = MemoryCounterStore::new();
        assert!(store.set_count_if_absent("k", 100, 60).await.unwrap());
        assert!(!store.set_count_if_absent("k", 999, 60).await.unwrap());
        assert_eq!(store.get_count("k").await.unwrap(), Some(100));

        // Live counters created by increments are also "present"
        store.incr("j").await.unwrap();
        assert!(!store.set_count_if_absent("j", 999, 60).await.unwrap());
        assert_eq!(store.get_count("j").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_marker_exists_and_delete() {
        let store = MemoryCounterStore::new();
        assert!(!store.exists("m").await.unwrap());
        store.set_marker("m", 60).await.unwrap();
        assert!(store.exists("m").await.unwrap());
        store.delete("m").await.unwrap();
        assert!(!store.exists("m").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_membership() {
        let store = MemoryCounterStore::new();
        assert!(store.set_add("s", "u1").await.unwrap());
        assert!(!store.set_add("s", "u1").await.unwrap());
        assert!(store.set_is_member("s", "u1").await.unwrap());
        assert!(store.set_remove("s", "u1").await.unwrap());
        assert!(!store.set_remove("s", "u1").await.unwrap());
        assert!(!store.set_is_member("s", "u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_add_batch_default_impl() {
        let store = MemoryCounterStore::new();
        store
            .set_add_batch(&[("s".into(), "u1".into()), ("s".into(), "u2".into())])
            .await
            .unwrap();
        assert!(store.set_is_member("s", "u1").await.unwrap());
        assert!(store.set_is_member("s", "u2").await.unwrap());
    }

    #[tokio::test]
    async fn test_unavailable_mode_fails_everything() {
        let store = MemoryCounterStore::new();
        store.set_unavailable(true);
        assert!(store.incr("k").await.is_err());
        assert!(store.ping().await.is_err());
        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_durable_like_rows_idempotent() {
        let store = MemoryDurableStore::new();
        store.seed_published_video("v1", "One");
        assert!(store.create_like("u1", "v1").await.unwrap());
        assert!(!store.create_like("u1", "v1").await.unwrap());
        assert_eq!(store.like_row_count(), 1);
        assert!(store.has_like("u1", "v1").await.unwrap());

        assert!(store.delete_like("u1", "v1").await.unwrap());
        assert!(!store.delete_like("u1", "v1").await.unwrap());
        assert!(!store.has_like("u1", "v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_durable_adjust_clamps_at_zero() {
        let store = MemoryDurableStore::new();
        store.seed_published_video("v1", "One");
        store.adjust_video_likes("v1", -3).await.unwrap();
        let video = store.find_video("v1").await.unwrap().unwrap();
        assert_eq!(video.likes_count, 0);
    }

    #[tokio::test]
    async fn test_find_user_likes_bulk() {
        let store = MemoryDurableStore::new();
        store.seed_published_video("v1", "One");
        store.seed_published_video("v2", "Two");
        store.create_like("u1", "v1").await.unwrap();

        let liked = store
            .find_user_likes("u1", &["v1".into(), "v2".into()])
            .await
            .unwrap();
        assert_eq!(liked, vec!["v1".to_string()]);
    }
}

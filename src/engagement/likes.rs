// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Like toggling, like-status reads and like-cache warmup.
//!
//! The counter store is authoritative for toggle decisions: membership
//! sets decide the current state, the flip happens through atomic set
//! and counter operations, and the matching durable writes are queued
//! for the reconcile worker. On a cold cache the durable store breaks
//! the tie and the answer is backfilled into the set.

use tracing::{debug, warn};

use super::types::{EngagementError, LikeState};
use super::EngagementService;
use crate::keys;
use crate::metrics;
use crate::ratelimit::ActionKind;
use crate::reconcile::ReconcileJob;

impl EngagementService {
    /// Toggle the calling user's like on a video.
    ///
    /// Unlike views, an over-quota toggle is a hard error: the caller
    /// asked for a state change and did not get one.
    #[tracing::instrument(skip(self, user_id), fields(video_id = video_id))]
    pub async fn toggle_like(
        &self,
        video_id: &str,
        user_id: Option<&str>,
    ) -> Result<LikeState, EngagementError> {
        let start = std::time::Instant::now();
        let user = user_id.ok_or(EngagementError::AuthRequired)?;

        if !self.limiter().check(user, ActionKind::Like).await? {
            return Err(EngagementError::RateLimited);
        }

        let video = self
            .durable()
            .find_video(video_id)
            .await?
            .ok_or_else(|| EngagementError::NotFound(video_id.to_string()))?;
        if !video.status.is_published() {
            return Err(EngagementError::NotPublished(video_id.to_string()));
        }

        let set_key = keys::video_likes_set(video_id);
        let count_key = keys::video_like_count(video_id);

        let is_liked = self
            .resolve_like_state(&set_key, user, || self.durable().has_like(user, video_id))
            .await?;
        self.warm_like_count(&count_key, video.likes_count).await?;

        let like_count = if is_liked {
            self.counters().set_remove(&set_key, user).await?;
            self.counters()
                .delete(&keys::like_marker(user, video_id))
                .await?;
            let count = self.counters().decr(&count_key).await?;
            self.reconciler().dispatch(ReconcileJob::LikeDelete {
                user_id: user.to_string(),
                video_id: video_id.to_string(),
            });
            metrics::record_like_toggle("video", "unlike");
            count
        } else {
            self.counters().set_add(&set_key, user).await?;
            self.counters()
                .set_marker(
                    &keys::like_marker(user, video_id),
                    self.config().like_marker_ttl_secs,
                )
                .await?;
            let count = self.counters().incr(&count_key).await?;
            self.reconciler().dispatch(ReconcileJob::LikeCreate {
                user_id: user.to_string(),
                video_id: video_id.to_string(),
            });
            metrics::record_like_toggle("video", "like");
            count
        };

        self.refresh_like_ttls(&count_key, &set_key).await;
        metrics::record_latency("counter", "like", start.elapsed());

        Ok(LikeState {
            is_liked: !is_liked,
            like_count: like_count.max(0) as u64,
        })
    }

    /// Toggle the calling user's like on a comment. Comments have no
    /// publication gate; existing comments are likeable.
    #[tracing::instrument(skip(self, user_id), fields(comment_id = comment_id))]
    pub async fn toggle_comment_like(
        &self,
        comment_id: &str,
        user_id: Option<&str>,
    ) -> Result<LikeState, EngagementError> {
        let user = user_id.ok_or(EngagementError::AuthRequired)?;

        if !self.limiter().check(user, ActionKind::Like).await? {
            return Err(EngagementError::RateLimited);
        }

        let comment = self
            .durable()
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| EngagementError::NotFound(comment_id.to_string()))?;

        let set_key = keys::comment_likes_set(comment_id);
        let count_key = keys::comment_like_count(comment_id);

        let is_liked = self
            .resolve_like_state(&set_key, user, || {
                self.durable().has_comment_like(user, comment_id)
            })
            .await?;
        self.warm_like_count(&count_key, comment.likes_count).await?;

        let like_count = if is_liked {
            self.counters().set_remove(&set_key, user).await?;
            self.counters()
                .delete(&keys::like_marker(user, comment_id))
                .await?;
            let count = self.counters().decr(&count_key).await?;
            self.reconciler()
                .dispatch(ReconcileJob::CommentLikeDelete {
                    user_id: user.to_string(),
                    comment_id: comment_id.to_string(),
                });
            metrics::record_like_toggle("comment", "unlike");
            count
        } else {
            self.counters().set_add(&set_key, user).await?;
            self.counters()
                .set_marker(
                    &keys::like_marker(user, comment_id),
                    self.config().like_marker_ttl_secs,
                )
                .await?;
            let count = self.counters().incr(&count_key).await?;
            self.reconciler()
                .dispatch(ReconcileJob::CommentLikeCreate {
                    user_id: user.to_string(),
                    comment_id: comment_id.to_string(),
                });
            metrics::record_like_toggle("comment", "like");
            count
        };

        self.refresh_like_ttls(&count_key, &set_key).await;

        Ok(LikeState {
            is_liked: !is_liked,
            like_count: like_count.max(0) as u64,
        })
    }

    /// Like count plus whether `user_id` (when present) has liked the
    /// video. Anonymous callers get `is_liked: false`.
    pub async fn get_like_status(
        &self,
        video_id: &str,
        user_id: Option<&str>,
    ) -> Result<LikeState, EngagementError> {
        let count_key = keys::video_like_count(video_id);

        let like_count = match self.counters().get_count(&count_key).await {
            Ok(Some(count)) => count.max(0) as u64,
            Ok(None) | Err(_) => {
                metrics::record_read_fallback("like_status");
                let video = self
                    .durable()
                    .find_video(video_id)
                    .await?
                    .ok_or_else(|| EngagementError::NotFound(video_id.to_string()))?;
                let baseline = video.likes_count.max(0) as u64;
                if let Err(e) = self
                    .counters()
                    .set_count_if_absent(
                        &count_key,
                        baseline as i64,
                        self.config().counter_ttl_secs,
                    )
                    .await
                {
                    debug!(error = %e, "Cache warm skipped");
                }
                baseline
            }
        };

        let is_liked = match user_id {
            Some(user) => {
                self.resolve_like_state(&keys::video_likes_set(video_id), user, || {
                    self.durable().has_like(user, video_id)
                })
                .await?
            }
            None => false,
        };

        Ok(LikeState {
            is_liked,
            like_count,
        })
    }

    /// Backfill the membership sets for every video in `video_ids` that
    /// `user_id` has liked, using one bulk durable query and one
    /// pipelined write. Returns how many likes were warmed.
    pub async fn warmup_like_cache(
        &self,
        user_id: &str,
        video_ids: &[String],
    ) -> Result<usize, EngagementError> {
        if video_ids.is_empty() {
            return Ok(0);
        }

        let liked = self.durable().find_user_likes(user_id, video_ids).await?;
        if liked.is_empty() {
            return Ok(0);
        }

        let pairs: Vec<(String, String)> = liked
            .iter()
            .map(|video_id| (keys::video_likes_set(video_id), user_id.to_string()))
            .collect();
        self.counters().set_add_batch(&pairs).await?;

        metrics::record_operation("counter", "warmup", "success");
        Ok(liked.len())
    }

    /// Resolve the current like state: membership set first, durable
    /// row as tiebreaker on a cold set (with backfill). A counter-store
    /// failure reads like a cold set: the durable row still answers.
    async fn resolve_like_state<F, Fut>(
        &self,
        set_key: &str,
        user: &str,
        durable_check: F,
    ) -> Result<bool, EngagementError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<bool, crate::store::traits::StoreError>>,
    {
        match self.counters().set_is_member(set_key, user).await {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "Membership read failed, falling back");
            }
        }

        if durable_check().await? {
            metrics::record_read_fallback("like_membership");
            if let Err(e) = self.counters().set_add(set_key, user).await {
                warn!(error = %e, "Like membership backfill failed");
            }
            return Ok(true);
        }
        Ok(false)
    }

    /// Engaged keys stay warm for the marker TTL.
    async fn refresh_like_ttls(&self, count_key: &str, set_key: &str) {
        let ttl = self.config().counter_ttl_secs;
        if let Err(e) = self.counters().expire(count_key, ttl).await {
            debug!(error = %e, "Counter TTL refresh failed");
        }
        if let Err(e) = self
            .counters()
            .expire(set_key, self.config().like_marker_ttl_secs)
            .await
        {
            debug!(error = %e, "Set TTL refresh failed");
        }
    }

    async fn warm_like_count(
        &self,
        count_key: &str,
        durable_baseline: i64,
    ) -> Result<(), EngagementError> {
        // SET-NX seeding: a concurrent toggle's increment survives
        self.counters()
            .set_count_if_absent(
                count_key,
                durable_baseline.max(0),
                self.config().counter_ttl_secs,
            )
            .await?;
        Ok(())
    }
}

// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! View recording and view-count reads.

use std::collections::HashMap;
use tracing::{debug, warn};

use super::types::{EngagementError, ViewOutcome};
use super::EngagementService;
use crate::fingerprint::RequestContext;
use crate::keys;
use crate::metrics;
use crate::ratelimit::ActionKind;
use crate::reconcile::ReconcileJob;
use crate::store::traits::SampledView;

impl EngagementService {
    /// Record one view attempt for a video.
    ///
    /// Pipeline: fingerprint → rate limit → publication check → dedup
    /// marker → atomic increment. Over-quota and deduped attempts are
    /// benign outcomes carrying the current count where known. A small
    /// configured fraction of counted views is additionally queued as an
    /// analytics row; that write is never awaited and never affects the
    /// outcome.
    #[tracing::instrument(skip(self, ctx), fields(video_id = video_id))]
    pub async fn record_view(
        &self,
        video_id: &str,
        ctx: &RequestContext,
    ) -> Result<ViewOutcome, EngagementError> {
        let start = std::time::Instant::now();
        let fingerprint = ctx.fingerprint(&self.config().fingerprint_salt);

        if !self
            .limiter()
            .check(fingerprint.as_str(), ActionKind::View)
            .await?
        {
            debug!(actor = %fingerprint, "View over quota");
            return Ok(ViewOutcome::RateLimited);
        }

        let video = self
            .durable()
            .find_video(video_id)
            .await?
            .ok_or_else(|| EngagementError::NotFound(video_id.to_string()))?;
        if !video.status.is_published() {
            return Err(EngagementError::NotPublished(video_id.to_string()));
        }

        let marker_key = keys::view_marker(video_id, fingerprint.as_str());
        let count_key = keys::view_count(video_id);

        if self.counters().exists(&marker_key).await? {
            metrics::record_view_dedup_hit();
            let count = self.current_view_count(&count_key, video.views_count).await;
            return Ok(ViewOutcome::AlreadyCounted(count));
        }

        // Cold counter: seed from the durable baseline before counting,
        // so the fast path never restarts a popular video at 1. SET-NX
        // keeps the seed from clobbering a concurrent increment.
        self.counters()
            .set_count_if_absent(
                &count_key,
                video.views_count as i64,
                self.config().counter_ttl_secs,
            )
            .await?;

        self.counters()
            .set_marker(&marker_key, self.config().view_dedup_ttl_secs)
            .await?;
        let new_count = self.counters().incr(&count_key).await?;
        self.counters()
            .expire(&count_key, self.config().counter_ttl_secs)
            .await?;
        metrics::record_view_counted();
        metrics::record_latency("counter", "view", start.elapsed());

        self.maybe_sample_view(video_id, fingerprint.as_str(), ctx);

        Ok(ViewOutcome::Counted(new_count.max(0) as u64))
    }

    /// Current view count for a video. Prefers the fast path; on a miss
    /// falls back to the durable count and warms the counter.
    pub async fn get_view_count(&self, video_id: &str) -> Result<u64, EngagementError> {
        let count_key = keys::view_count(video_id);

        match self.counters().get_count(&count_key).await {
            Ok(Some(count)) => return Ok(count.max(0) as u64),
            Ok(None) => {}
            Err(e) => {
                // Reads fail open: serve the durable count instead
                warn!(error = %e, "Counter store read failed, falling back");
            }
        }
        metrics::record_read_fallback("view_count");

        let video = self
            .durable()
            .find_video(video_id)
            .await?
            .ok_or_else(|| EngagementError::NotFound(video_id.to_string()))?;

        if let Err(e) = self
            .counters()
            .set_count_if_absent(
                &count_key,
                video.views_count as i64,
                self.config().counter_ttl_secs,
            )
            .await
        {
            debug!(error = %e, "Cache warm skipped");
        }
        Ok(video.views_count)
    }

    /// Batched view counts, keyed by video id. One pipelined multi-get,
    /// then a single durable query for the misses; unknown ids read as
    /// zero. The batch path never writes back to the counter store.
    pub async fn get_view_counts(
        &self,
        video_ids: &[String],
    ) -> Result<HashMap<String, u64>, EngagementError> {
        if video_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let count_keys: Vec<String> = video_ids.iter().map(|id| keys::view_count(id)).collect();
        let cached = match self.counters().get_counts(&count_keys).await {
            Ok(values) => values,
            Err(e) => {
                warn!(error = %e, "Counter store batch read failed, falling back");
                vec![None; video_ids.len()]
            }
        };

        let misses: Vec<String> = video_ids
            .iter()
            .zip(&cached)
            .filter(|(_, v)| v.is_none())
            .map(|(id, _)| id.clone())
            .collect();

        let mut durable_counts = HashMap::new();
        if !misses.is_empty() {
            metrics::record_read_fallback("batch_view_count");
            for video in self.durable().find_videos(&misses).await? {
                durable_counts.insert(video.id.clone(), video.views_count);
            }
        }

        Ok(video_ids
            .iter()
            .zip(cached)
            .map(|(id, cached)| {
                let count = match cached {
                    Some(count) => count.max(0) as u64,
                    None => durable_counts.get(id).copied().unwrap_or(0),
                };
                (id.clone(), count)
            })
            .collect())
    }

    async fn current_view_count(&self, count_key: &str, durable_baseline: u64) -> u64 {
        match self.counters().get_count(count_key).await {
            Ok(Some(count)) => count.max(0) as u64,
            _ => durable_baseline,
        }
    }

    fn maybe_sample_view(&self, video_id: &str, fingerprint: &str, ctx: &RequestContext) {
        if rand::random::<f64>() >= self.config().view_sampling_rate {
            return;
        }

        let queued = self
            .reconciler()
            .dispatch(ReconcileJob::SampledView(SampledView {
                video_id: video_id.to_string(),
                fingerprint: fingerprint.to_string(),
                user_agent: ctx.user_agent.clone(),
                country: ctx.country.clone(),
            }));
        metrics::record_sampled_view(if queued { "queued" } else { "dropped" });
    }
}

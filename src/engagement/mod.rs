// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The engagement service: orchestrates rate limiting, dedup, fast-path
//! counter mutation, asynchronous reconciliation and the search cascade.
//!
//! Construction is two-phase, mirroring the backends' lifecycles:
//! [`EngagementService::connect`] establishes connections (or
//! [`EngagementService::with_stores`] injects them), then
//! [`EngagementService::start`] spawns the reconcile worker and probes
//! the search capability. [`EngagementService::shutdown`] drains the
//! reconcile queue before returning.

mod likes;
mod types;
mod views;

pub use types::{EngagementError, HealthStatus, LikeState, ViewOutcome};

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::EngagementConfig;
use crate::metrics;
use crate::ratelimit::RateLimiter;
use crate::reconcile::Reconciler;
use crate::search::{SearchCascade, SearchOptions, SearchResponse};
use crate::store::redis::RedisCounterStore;
use crate::store::sql::SqlDurableStore;
use crate::store::traits::{CounterStore, DurableStore, StoreError};

pub struct EngagementService {
    counters: Arc<dyn CounterStore>,
    durable: Arc<dyn DurableStore>,
    limiter: RateLimiter,
    reconciler: Arc<Reconciler>,
    search: Arc<SearchCascade>,
    config: EngagementConfig,
}

impl EngagementService {
    /// Build a service over already-constructed stores. This is the
    /// seam tests and embedders use; [`connect`](Self::connect) is the
    /// production path.
    pub fn with_stores(
        config: EngagementConfig,
        counters: Arc<dyn CounterStore>,
        durable: Arc<dyn DurableStore>,
    ) -> Self {
        let limiter = RateLimiter::new(
            counters.clone(),
            config.view_rate_limit,
            config.like_rate_limit,
            config.rate_window_secs,
        );
        let reconciler = Arc::new(Reconciler::new(durable.clone(), config.reconcile_queue_size));
        let search = Arc::new(SearchCascade::new(durable.clone(), config.search_page_size));

        Self {
            counters,
            durable,
            limiter,
            reconciler,
            search,
            config,
        }
    }

    /// Connect to the configured Redis and SQL backends.
    pub async fn connect(config: EngagementConfig) -> Result<Self, EngagementError> {
        let redis_url = config
            .redis_url
            .as_deref()
            .ok_or_else(|| EngagementError::Config("redis_url is not set".into()))?;
        let sql_url = config
            .sql_url
            .as_deref()
            .ok_or_else(|| EngagementError::Config("sql_url is not set".into()))?;

        let counters: Arc<dyn CounterStore> = Arc::new(RedisCounterStore::new(redis_url).await?);
        let durable: Arc<dyn DurableStore> = Arc::new(SqlDurableStore::new(sql_url).await?);
        info!("Engagement backends connected");

        Ok(Self::with_stores(config, counters, durable))
    }

    /// Spawn the reconcile worker and probe the search capability.
    pub async fn start(&mut self) -> Result<(), EngagementError> {
        self.reconciler.spawn();
        self.search.probe().await;

        let health = self.health_check().await;
        if !health.healthy() {
            warn!(
                counter_store = health.counter_store,
                durable_store = health.durable_store,
                "Engagement service started with degraded backends"
            );
        } else {
            info!("Engagement service started");
        }
        Ok(())
    }

    /// Drain the reconcile queue and stop the worker.
    pub async fn shutdown(&self) {
        self.reconciler.shutdown().await;
        info!("Engagement service stopped");
    }

    /// Ping both backends and publish health gauges.
    pub async fn health_check(&self) -> HealthStatus {
        let (counter, durable) = tokio::join!(self.counters.ping(), self.durable.ping());

        HealthStatus {
            counter_store: report_health("redis", counter),
            durable_store: report_health("sql", durable),
        }
    }

    /// The search cascade, for callers that need tier provenance or
    /// direct access.
    #[must_use]
    pub fn search(&self) -> &SearchCascade {
        &self.search
    }

    /// Run the two-tier search cascade.
    pub async fn search_videos(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<SearchResponse, EngagementError> {
        Ok(self.search.search(query, options).await?)
    }

    /// Title suggestions for a partial query.
    pub async fn title_suggestions(
        &self,
        partial: &str,
        limit: usize,
    ) -> Result<Vec<String>, EngagementError> {
        Ok(self.search.suggestions(partial, limit).await?)
    }

    pub(crate) fn config(&self) -> &EngagementConfig {
        &self.config
    }

    pub(crate) fn counters(&self) -> &Arc<dyn CounterStore> {
        &self.counters
    }

    pub(crate) fn durable(&self) -> &Arc<dyn DurableStore> {
        &self.durable
    }

    pub(crate) fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub(crate) fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }
}

fn report_health(backend: &str, result: Result<(), StoreError>) -> bool {
    let healthy = result.is_ok();
    metrics::set_backend_healthy(backend, healthy);
    if let Err(e) = result {
        warn!(backend = backend, error = %e, "Backend health probe failed");
        metrics::record_connection_error(backend);
    }
    healthy
}

// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Two-tier search fallback cascade over the durable store.
//!
//! ```text
//! search(query, options)
//!       │
//!       ├─→ Tier 1: trigram-similarity query (when capability present)
//!       │        │
//!       │        └─→ Rows? Return
//!       │
//!       └─→ Tier 2: case-insensitive substring/tag match
//! ```
//!
//! The similarity capability (e.g. pg_trgm) is probed ONCE at startup
//! via [`SearchCascade::probe`], not rediscovered through per-query
//! error handling. Both tiers exclude non-published videos and cap the
//! page size. The fast-path counter store is never involved.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::store::traits::{DurableStore, StoreError};

/// Requested result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Similarity rank (tier 1) or views-then-recency (tier 2).
    #[default]
    Relevance,
    /// Newest first.
    Recent,
    /// Most viewed first.
    Popular,
}

/// One search result row.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub video_id: String,
    pub title: String,
    pub views_count: u64,
    /// Epoch millis of publication; used for `Recent` ordering.
    pub created_at: i64,
}

/// Search request options.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    pub sort: SortMode,
    /// Capped at the configured page size.
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Which tier produced the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTier {
    Fuzzy,
    Basic,
    Empty,
}

/// Search results with provenance.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub tier: SearchTier,
}

/// Two-tier query strategy with a startup capability check.
pub struct SearchCascade {
    durable: Arc<dyn DurableStore>,
    fuzzy_available: AtomicBool,
    max_page_size: usize,
}

impl SearchCascade {
    pub fn new(durable: Arc<dyn DurableStore>, max_page_size: usize) -> Self {
        Self {
            durable,
            fuzzy_available: AtomicBool::new(false),
            max_page_size,
        }
    }

    /// Probe the similarity capability once. Call at startup.
    pub async fn probe(&self) {
        let available = self.durable.supports_fuzzy_search().await;
        self.fuzzy_available.store(available, Ordering::Release);
        info!(fuzzy_available = available, "Search capability probed");
    }

    /// Whether tier 1 is in play.
    #[must_use]
    pub fn fuzzy_available(&self) -> bool {
        self.fuzzy_available.load(Ordering::Acquire)
    }

    /// Run the cascade. Queries shorter than two characters return empty
    /// without touching the store.
    pub async fn search(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<SearchResponse, StoreError> {
        let query = query.trim();
        if query.len() < 2 {
            return Ok(SearchResponse {
                hits: vec![],
                tier: SearchTier::Empty,
            });
        }

        let limit = options.limit.unwrap_or(self.max_page_size).min(self.max_page_size);
        let start = Instant::now();

        // Tier 1: similarity-ranked, only when the capability probe passed
        if self.fuzzy_available() {
            match self
                .durable
                .search_videos_fuzzy(query, options.sort, limit, options.offset)
                .await
            {
                Ok(hits) if !hits.is_empty() => {
                    debug!(count = hits.len(), "Fuzzy search results");
                    metrics::record_search_query("fuzzy", "success");
                    metrics::record_search_latency("fuzzy", start.elapsed());
                    return Ok(SearchResponse {
                        hits,
                        tier: SearchTier::Fuzzy,
                    });
                }
                Ok(_) => {
                    metrics::record_search_query("fuzzy", "empty");
                }
                Err(e) => {
                    // Capability was probed at startup; a runtime failure
                    // here is a backend hiccup, not a missing extension.
                    warn!(error = %e, "Fuzzy search failed, falling back to basic");
                    metrics::record_search_query("fuzzy", "error");
                }
            }
        }

        // Tier 2: substring/tag match
        let basic_start = Instant::now();
        let hits = self
            .durable
            .search_videos_basic(query, options.sort, limit, options.offset)
            .await?;
        metrics::record_search_query("basic", "success");
        metrics::record_search_latency("basic", basic_start.elapsed());

        let tier = if hits.is_empty() {
            SearchTier::Empty
        } else {
            SearchTier::Basic
        };
        Ok(SearchResponse { hits, tier })
    }

    /// Title suggestions for a partial query, most-viewed first.
    pub async fn suggestions(
        &self,
        partial: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        let partial = partial.trim();
        if partial.len() < 2 {
            return Ok(vec![]);
        }
        self.durable
            .title_suggestions(partial, limit.min(self.max_page_size))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryDurableStore;

    fn seeded_store() -> Arc<MemoryDurableStore> {
        let store = Arc::new(MemoryDurableStore::new());
        store.seed_published_video_at("v1", "Alpine climbing basics", 100, 1_000);
        store.seed_published_video_at("v2", "Climbing knots explained", 500, 2_000);
        store.seed_published_video_at("v3", "Baking sourdough", 900, 3_000);
        store.seed_draft_video("v4", "Climbing draft");
        store
    }

    #[tokio::test]
    async fn test_short_query_returns_empty_without_store_access() {
        let cascade = SearchCascade::new(seeded_store(), 24);
        let resp = cascade.search(" a ", SearchOptions::default()).await.unwrap();
        assert!(resp.hits.is_empty());
        assert_eq!(resp.tier, SearchTier::Empty);
    }

    #[tokio::test]
    async fn test_basic_tier_when_fuzzy_unavailable() {
        let store = seeded_store();
        store.set_fuzzy_supported(false);
        let cascade = SearchCascade::new(store, 24);
        cascade.probe().await;
        assert!(!cascade.fuzzy_available());

        let resp = cascade.search("climbing", SearchOptions::default()).await.unwrap();
        assert_eq!(resp.tier, SearchTier::Basic);
        assert_eq!(resp.hits.len(), 2);
    }

    #[tokio::test]
    async fn test_fuzzy_tier_used_after_probe() {
        let store = seeded_store();
        store.set_fuzzy_supported(true);
        let cascade = SearchCascade::new(store, 24);
        cascade.probe().await;
        assert!(cascade.fuzzy_available());

        let resp = cascade.search("climbing", SearchOptions::default()).await.unwrap();
        assert_eq!(resp.tier, SearchTier::Fuzzy);
        assert!(!resp.hits.is_empty());
    }

    #[tokio::test]
    async fn test_draft_videos_excluded() {
        let store = seeded_store();
        store.set_fuzzy_supported(false);
        let cascade = SearchCascade::new(store, 24);
        cascade.probe().await;

        let resp = cascade.search("climbing", SearchOptions::default()).await.unwrap();
        assert!(resp.hits.iter().all(|h| h.video_id != "v4"));
    }

    #[tokio::test]
    async fn test_sort_modes() {
        let store = seeded_store();
        store.set_fuzzy_supported(false);
        let cascade = SearchCascade::new(store, 24);
        cascade.probe().await;

        let popular = cascade
            .search(
                "climbing",
                SearchOptions {
                    sort: SortMode::Popular,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(popular.hits[0].video_id, "v2"); // 500 views > 100

        let recent = cascade
            .search(
                "climbing",
                SearchOptions {
                    sort: SortMode::Recent,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(recent.hits[0].video_id, "v2"); // created later
    }

    #[tokio::test]
    async fn test_limit_capped_at_page_size() {
        let store = seeded_store();
        store.set_fuzzy_supported(false);
        let cascade = SearchCascade::new(store, 1);
        cascade.probe().await;

        let resp = cascade
            .search(
                "climbing",
                SearchOptions {
                    limit: Some(100),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.hits.len(), 1);
    }

    #[tokio::test]
    async fn test_suggestions_most_viewed_first() {
        let cascade = SearchCascade::new(seeded_store(), 24);
        let titles = cascade.suggestions("climbing", 5).await.unwrap();
        assert_eq!(titles.first().map(String::as_str), Some("Climbing knots explained"));
    }

    #[tokio::test]
    async fn test_suggestions_short_prefix_empty() {
        let cascade = SearchCascade::new(seeded_store(), 24);
        assert!(cascade.suggestions("c", 5).await.unwrap().is_empty());
    }
}

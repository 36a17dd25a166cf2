//! # Engagement Engine
//!
//! Engagement counting (video views, video/comment likes) with a Redis
//! fast path and asynchronous reconciliation into a durable SQL store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    EngagementService                        │
//! │  • record_view / toggle_like / read paths                  │
//! │  • Per-actor sliding-window rate limiting                  │
//! │  • View dedup by salted IP fingerprint (24h TTL)           │
//! └─────────────────────────────────────────────────────────────┘
//!            │ synchronous                     │ fire-and-forget
//!            ▼                                 ▼
//! ┌──────────────────────────┐   ┌─────────────────────────────┐
//! │   CounterStore (Redis)   │   │   Reconciler (worker task)  │
//! │  • Atomic INCR/DECR      │   │  • Bounded queue + retry    │
//! │  • Membership SETs       │   │  • Like rows + counter      │
//! │  • TTL'd dedup markers   │   │    deltas, sampled views    │
//! └──────────────────────────┘   └─────────────────────────────┘
//!                                              │
//!                                              ▼
//!                                ┌─────────────────────────────┐
//!                                │  DurableStore (SQL)         │
//!                                │  • Ground-truth counts      │
//!                                │  • likes / comment_likes    │
//!                                │  • Sampled view analytics   │
//!                                │  • Search fallback cascade  │
//!                                └─────────────────────────────┘
//! ```
//!
//! Reads prefer the counter store and fall back to SQL on a miss,
//! warming the cache on the way back. Fast-path counts may drift from
//! the durable counts between reconciliation events but converge once
//! the reconcile queue drains.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use engagement_engine::{EngagementService, EngagementConfig, RequestContext};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = EngagementConfig {
//!         redis_url: Some("redis://localhost:6379".into()),
//!         sql_url: Some("sqlite:engagement.db".into()),
//!         ..Default::default()
//!     };
//!
//!     let mut service = EngagementService::connect(config).await.expect("connect");
//!     service.start().await.expect("start");
//!
//!     let ctx = RequestContext::new("203.0.113.7")
//!         .with_user_agent("Mozilla/5.0")
//!         .with_country("DE");
//!     let outcome = service.record_view("video-123", &ctx).await.expect("view");
//!     println!("view outcome: {:?}", outcome);
//!
//!     service.shutdown().await;
//! }
//! ```
//!
//! ## Modules
//!
//! - [`engagement`]: The [`EngagementService`] orchestrating all components
//! - [`store`]: Counter store (Redis) and durable store (SQL) backends
//! - [`ratelimit`]: Sliding-window per-actor rate limiter
//! - [`reconcile`]: Bounded-queue async reconciliation worker
//! - [`search`]: Two-tier search fallback cascade over the durable store
//! - [`resilience`]: Retry with exponential backoff

pub mod config;
pub mod engagement;
pub mod fingerprint;
pub mod keys;
pub mod metrics;
pub mod ratelimit;
pub mod reconcile;
pub mod resilience;
pub mod search;
pub mod store;

pub use config::EngagementConfig;
pub use engagement::{EngagementError, EngagementService, HealthStatus, LikeState, ViewOutcome};
pub use fingerprint::{ActorFingerprint, RequestContext};
pub use ratelimit::{ActionKind, RateLimiter};
pub use reconcile::{ReconcileJob, Reconciler};
pub use resilience::retry::RetryConfig;
pub use search::{SearchCascade, SearchHit, SearchOptions, SearchResponse, SortMode};
pub use store::traits::{CounterStore, DurableStore, StoreError, VideoRecord, VideoStatus};

//! Configuration for the engagement engine.
//!
//! # Example
//!
//! ```
//! use engagement_engine::EngagementConfig;
//!
//! // Minimal config (uses defaults)
//! let config = EngagementConfig::default();
//! assert_eq!(config.view_rate_limit, 5);
//! assert_eq!(config.view_sampling_rate, 0.1);
//!
//! // Full config
//! let config = EngagementConfig {
//!     redis_url: Some("redis://localhost:6379".into()),
//!     sql_url: Some("sqlite:engagement.db".into()),
//!     like_rate_limit: 20,
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;

/// Configuration for the engagement engine.
///
/// All fields have sensible defaults. At minimum, configure `redis_url`
/// and `sql_url` for production use. Every field can also be injected
/// from the environment with an `ENGAGEMENT_` prefix via
/// [`EngagementConfig::from_env`].
#[derive(Debug, Clone, Deserialize)]
pub struct EngagementConfig {
    /// Redis connection string (e.g., "redis://localhost:6379")
    #[serde(default)]
    pub redis_url: Option<String>,

    /// SQL connection string (e.g., "sqlite:engagement.db" or "mysql://...")
    #[serde(default)]
    pub sql_url: Option<String>,

    /// Salt mixed into the client-address hash. Rotating it resets dedup.
    #[serde(default = "default_fingerprint_salt")]
    pub fingerprint_salt: String,

    /// Max counted-view attempts per fingerprint per window (default: 5)
    #[serde(default = "default_view_rate_limit")]
    pub view_rate_limit: u32,

    /// Max like toggles per actor per window (default: 10)
    #[serde(default = "default_like_rate_limit")]
    pub like_rate_limit: u32,

    /// Rate-limit window length in seconds (default: 60)
    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: u64,

    /// View dedup marker TTL in seconds (default: 24h)
    #[serde(default = "default_view_dedup_ttl_secs")]
    pub view_dedup_ttl_secs: u64,

    /// Counter key TTL in seconds, refreshed on every mutation (default: 30 days)
    #[serde(default = "default_counter_ttl_secs")]
    pub counter_ttl_secs: u64,

    /// Per-pair like marker TTL in seconds (default: 30 days)
    #[serde(default = "default_like_marker_ttl_secs")]
    pub like_marker_ttl_secs: u64,

    /// Fraction of counted views persisted as analytics rows (default: 0.1)
    #[serde(default = "default_view_sampling_rate")]
    pub view_sampling_rate: f64,

    /// Reconcile queue capacity; jobs beyond this are dropped with a warning
    #[serde(default = "default_reconcile_queue_size")]
    pub reconcile_queue_size: usize,

    /// Max search results per page (default: 24)
    #[serde(default = "default_search_page_size")]
    pub search_page_size: usize,
}

fn default_fingerprint_salt() -> String {
    "engagement-v1".to_string()
}
fn default_view_rate_limit() -> u32 {
    5
}
fn default_like_rate_limit() -> u32 {
    10
}
fn default_rate_window_secs() -> u64 {
    60
}
fn default_view_dedup_ttl_secs() -> u64 {
    86_400
}
fn default_counter_ttl_secs() -> u64 {
    86_400 * 30
}
fn default_like_marker_ttl_secs() -> u64 {
    86_400 * 30
}
fn default_view_sampling_rate() -> f64 {
    0.1
}
fn default_reconcile_queue_size() -> usize {
    1024
}
fn default_search_page_size() -> usize {
    24
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            sql_url: None,
            fingerprint_salt: default_fingerprint_salt(),
            view_rate_limit: default_view_rate_limit(),
            like_rate_limit: default_like_rate_limit(),
            rate_window_secs: default_rate_window_secs(),
            view_dedup_ttl_secs: default_view_dedup_ttl_secs(),
            counter_ttl_secs: default_counter_ttl_secs(),
            like_marker_ttl_secs: default_like_marker_ttl_secs(),
            view_sampling_rate: default_view_sampling_rate(),
            reconcile_queue_size: default_reconcile_queue_size(),
            search_page_size: default_search_page_size(),
        }
    }
}

impl EngagementConfig {
    /// Load config from `ENGAGEMENT_`-prefixed environment variables.
    ///
    /// Unset variables fall back to the field defaults, so a bare
    /// environment yields `EngagementConfig::default()`.
    ///
    /// ```text
    /// ENGAGEMENT_REDIS_URL=redis://cache:6379
    /// ENGAGEMENT_SQL_URL=mysql://app@db/engagement
    /// ENGAGEMENT_VIEW_RATE_LIMIT=5
    /// ENGAGEMENT_LIKE_RATE_LIMIT=10
    /// ENGAGEMENT_VIEW_SAMPLING_RATE=0.1
    /// ```
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("ENGAGEMENT_").from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_platform_limits() {
        let config = EngagementConfig::default();
        assert_eq!(config.view_rate_limit, 5);
        assert_eq!(config.like_rate_limit, 10);
        assert_eq!(config.rate_window_secs, 60);
        assert_eq!(config.view_dedup_ttl_secs, 86_400);
        assert_eq!(config.counter_ttl_secs, 86_400 * 30);
        assert_eq!(config.view_sampling_rate, 0.1);
    }

    #[test]
    fn test_from_env_uses_defaults_when_unset() {
        // No ENGAGEMENT_* vars set in the test environment for these fields
        let config = EngagementConfig::from_env().expect("env parse");
        assert_eq!(config.search_page_size, 24);
    }
}

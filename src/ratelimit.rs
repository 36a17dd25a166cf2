// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Sliding-window rate limiting on top of the counter store.
//!
//! Uses the classic two-fixed-window approximation: each actor/action
//! pair gets one counter per window slot, and the effective request
//! count is the current slot plus the previous slot weighted by how
//! much of it still overlaps the sliding window. Costs two atomic
//! counter operations per check, no sorted sets, no Lua.
//!
//! Counter-store failures propagate as errors; the caller decides
//! whether that fails the request closed (writes do) or open.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::keys;
use crate::metrics;
use crate::store::traits::{CounterStore, StoreError};

/// Rate-limited action category. Each category has its own quota and
/// its own counters, so a burst of views never starves likes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    View,
    Like,
}

impl ActionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::View => "view",
            ActionKind::Like => "like",
        }
    }
}

pub struct RateLimiter {
    counters: Arc<dyn CounterStore>,
    view_quota: u32,
    like_quota: u32,
    window_secs: u64,
}

impl RateLimiter {
    pub fn new(
        counters: Arc<dyn CounterStore>,
        view_quota: u32,
        like_quota: u32,
        window_secs: u64,
    ) -> Self {
        Self {
            counters,
            view_quota,
            like_quota,
            window_secs: window_secs.max(1),
        }
    }

    #[must_use]
    pub fn quota(&self, kind: ActionKind) -> u32 {
        match kind {
            ActionKind::View => self.view_quota,
            ActionKind::Like => self.like_quota,
        }
    }

    /// Record one request for `actor` and report whether it is within
    /// quota. Over-quota requests are still counted, so hammering the
    /// endpoint does not shorten the penalty.
    pub async fn check(&self, actor: &str, kind: ActionKind) -> Result<bool, StoreError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let slot = now / self.window_secs;
        let elapsed_frac = (now % self.window_secs) as f64 / self.window_secs as f64;

        let current_key = keys::rate_window(kind.as_str(), actor, slot);
        let previous_key = keys::rate_window(kind.as_str(), actor, slot.wrapping_sub(1));

        let current = self.counters.incr(&current_key).await?;
        // Slot counters only need to survive into the next slot
        self.counters
            .expire(&current_key, self.window_secs * 2)
            .await?;
        let previous = self.counters.get_count(&previous_key).await?.unwrap_or(0);

        let weighted = weighted_count(previous, current, elapsed_frac);
        let allowed = weighted <= f64::from(self.quota(kind));

        if !allowed {
            debug!(
                actor = actor,
                action = kind.as_str(),
                weighted,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(kind.as_str());
        }
        Ok(allowed)
    }
}

/// Previous-window requests decay linearly as the sliding window moves
/// past them.
fn weighted_count(previous: i64, current: i64, elapsed_frac: f64) -> f64 {
    previous.max(0) as f64 * (1.0 - elapsed_frac) + current.max(0) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryCounterStore;

    fn limiter(view_quota: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(
            Arc::new(MemoryCounterStore::new()),
            view_quota,
            10,
            window_secs,
        )
    }

    #[test]
    fn test_weighted_count_decay() {
        // Start of the window: previous counts in full
        assert_eq!(weighted_count(4, 1, 0.0), 5.0);
        // Halfway: previous counts half
        assert_eq!(weighted_count(4, 1, 0.5), 3.0);
        // End: previous gone
        assert_eq!(weighted_count(4, 1, 1.0), 1.0);
        // Negative counters never subtract
        assert_eq!(weighted_count(-2, 1, 0.0), 1.0);
    }

    #[tokio::test]
    async fn test_quota_enforced_within_window() {
        let limiter = limiter(3, 3600);
        for _ in 0..3 {
            assert!(limiter.check("actor", ActionKind::View).await.unwrap());
        }
        assert!(!limiter.check("actor", ActionKind::View).await.unwrap());
    }

    #[tokio::test]
    async fn test_actors_and_actions_are_independent() {
        let limiter = limiter(1, 3600);
        assert!(limiter.check("a", ActionKind::View).await.unwrap());
        assert!(!limiter.check("a", ActionKind::View).await.unwrap());

        // Different actor, fresh quota
        assert!(limiter.check("b", ActionKind::View).await.unwrap());
        // Same actor, different action, fresh quota
        assert!(limiter.check("a", ActionKind::Like).await.unwrap());
    }

    #[tokio::test]
    async fn test_quota_recovers_after_quiet_period() {
        let limiter = limiter(1, 1);
        assert!(limiter.check("actor", ActionKind::View).await.unwrap());
        assert!(!limiter.check("actor", ActionKind::View).await.unwrap());

        // Two full windows: both slots roll over and the weight decays out
        tokio::time::sleep(std::time::Duration::from_millis(2100)).await;
        assert!(limiter.check("actor", ActionKind::View).await.unwrap());
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let store = Arc::new(MemoryCounterStore::new());
        let limiter = RateLimiter::new(store.clone(), 5, 10, 60);
        store.set_unavailable(true);
        assert!(limiter.check("actor", ActionKind::View).await.is_err());
    }
}

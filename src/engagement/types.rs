// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Public result and error types for the engagement service.

use thiserror::Error;

use crate::store::traits::StoreError;

/// Result of a view recording attempt.
///
/// Rate limiting and dedup suppression are outcomes, not errors: the
/// caller renders the count either way and the UI stays quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOutcome {
    /// The view was counted; carries the new count.
    Counted(u64),
    /// A dedup marker suppressed the view; carries the unchanged count.
    AlreadyCounted(u64),
    /// The actor exceeded the view quota. No counter was touched.
    RateLimited,
}

impl ViewOutcome {
    /// The count to render, when one is available.
    #[must_use]
    pub fn count(&self) -> Option<u64> {
        match self {
            ViewOutcome::Counted(n) | ViewOutcome::AlreadyCounted(n) => Some(*n),
            ViewOutcome::RateLimited => None,
        }
    }
}

/// Like state as seen by one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub is_liked: bool,
    pub like_count: u64,
}

/// Backend health snapshot.
#[derive(Debug, Clone, Copy)]
pub struct HealthStatus {
    pub counter_store: bool,
    pub durable_store: bool,
}

impl HealthStatus {
    #[must_use]
    pub fn healthy(&self) -> bool {
        self.counter_store && self.durable_store
    }
}

#[derive(Error, Debug)]
pub enum EngagementError {
    /// The operation requires an authenticated user.
    #[error("Authentication required")]
    AuthRequired,

    /// The target video or comment does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The video exists but is not published; only published videos
    /// accrue engagement.
    #[error("Not published: {0}")]
    NotPublished(String),

    /// Like toggles over quota are rejected hard (unlike views, where
    /// rate limiting is a benign outcome).
    #[error("Rate limited")]
    RateLimited,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_outcome_count() {
        assert_eq!(ViewOutcome::Counted(3).count(), Some(3));
        assert_eq!(ViewOutcome::AlreadyCounted(3).count(), Some(3));
        assert_eq!(ViewOutcome::RateLimited.count(), None);
    }

    #[test]
    fn test_health_status() {
        let ok = HealthStatus {
            counter_store: true,
            durable_store: true,
        };
        assert!(ok.healthy());
        let degraded = HealthStatus {
            counter_store: false,
            durable_store: true,
        };
        assert!(!degraded.healthy());
    }

    #[test]
    fn test_store_error_converts() {
        let err: EngagementError = StoreError::Backend("boom".into()).into();
        assert!(matches!(err, EngagementError::Store(_)));
    }
}

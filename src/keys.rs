// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Counter-store key layout.
//!
//! All fast-path state lives under a handful of key families:
//!
//! ```text
//! video:{id}:view_count          counter, 30d TTL
//! video:{id}:viewed:{fp}         view dedup marker, 24h TTL
//! video:{id}:likes               SET of user ids
//! video:{id}:like_count          counter, 30d TTL
//! comment:{id}:likes             SET of user ids
//! comment:{id}:like_count        counter, 30d TTL
//! user:{uid}:like:{target}       per-pair like marker, 30d TTL
//! ratelimit:{action}:{actor}:{slot}   fixed-window counter
//! ```
//!
//! Centralized here so the service, limiter and tests agree on layout.

/// View counter for a video.
pub fn view_count(video_id: &str) -> String {
    format!("video:{}:view_count", video_id)
}

/// Dedup marker for one fingerprint having viewed one video.
pub fn view_marker(video_id: &str, fingerprint: &str) -> String {
    format!("video:{}:viewed:{}", video_id, fingerprint)
}

/// Like counter for a video.
pub fn video_like_count(video_id: &str) -> String {
    format!("video:{}:like_count", video_id)
}

/// Membership set of users who liked a video.
pub fn video_likes_set(video_id: &str) -> String {
    format!("video:{}:likes", video_id)
}

/// Like counter for a comment.
pub fn comment_like_count(comment_id: &str) -> String {
    format!("comment:{}:like_count", comment_id)
}

/// Membership set of users who liked a comment.
pub fn comment_likes_set(comment_id: &str) -> String {
    format!("comment:{}:likes", comment_id)
}

/// Per-pair like marker (actor, target).
pub fn like_marker(user_id: &str, target_id: &str) -> String {
    format!("user:{}:like:{}", user_id, target_id)
}

/// Fixed-window rate-limit slot for (action, actor).
pub fn rate_window(action: &str, actor: &str, slot: u64) -> String {
    format!("ratelimit:{}:{}:{}", action, actor, slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_families_are_disjoint() {
        assert_eq!(view_count("v1"), "video:v1:view_count");
        assert_eq!(view_marker("v1", "abc"), "video:v1:viewed:abc");
        assert_eq!(video_like_count("v1"), "video:v1:like_count");
        assert_eq!(video_likes_set("v1"), "video:v1:likes");
        assert_eq!(comment_like_count("c1"), "comment:c1:like_count");
        assert_eq!(like_marker("u1", "v1"), "user:u1:like:v1");
        assert_eq!(rate_window("view", "fp", 42), "ratelimit:view:fp:42");
    }
}

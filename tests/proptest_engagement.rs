// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Property tests: toggle sequences always flip strictly and counts
//! never go negative, for arbitrary interleavings of actors.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

use engagement_engine::store::memory::{MemoryCounterStore, MemoryDurableStore};
use engagement_engine::{
    DurableStore, EngagementConfig, EngagementService, RequestContext, ViewOutcome,
};

fn lenient_config() -> EngagementConfig {
    // Quotas high enough that rate limiting never interferes with the
    // invariant under test
    EngagementConfig {
        view_rate_limit: 10_000,
        like_rate_limit: 10_000,
        ..Default::default()
    }
}

async fn service_with_video() -> (EngagementService, Arc<MemoryDurableStore>) {
    let counters = Arc::new(MemoryCounterStore::new());
    let durable = Arc::new(MemoryDurableStore::new());
    durable.seed_published_video("v1", "One");
    let mut service =
        EngagementService::with_stores(lenient_config(), counters, durable.clone());
    service.start().await.expect("start");
    (service, durable)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn toggles_flip_strictly_and_count_tracks_liked_set(
        user_seq in prop::collection::vec(0..4usize, 1..40)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (service, durable) = service_with_video().await;
            let mut liked: HashSet<usize> = HashSet::new();

            for user in user_seq {
                let user_id = format!("user-{}", user);
                let state = service
                    .toggle_like("v1", Some(&user_id))
                    .await
                    .expect("toggle");

                let was_liked = liked.contains(&user);
                prop_assert_eq!(state.is_liked, !was_liked);
                if was_liked {
                    liked.remove(&user);
                } else {
                    liked.insert(user);
                }
                prop_assert_eq!(state.like_count, liked.len() as u64);
            }

            // Draining reconciliation converges the durable rows
            service.shutdown().await;
            prop_assert_eq!(durable.like_row_count(), liked.len());
            let video = durable.find_video("v1").await.unwrap().unwrap();
            prop_assert_eq!(video.likes_count, liked.len() as i64);
            Ok(())
        })?;
    }

    #[test]
    fn view_count_equals_distinct_fingerprints(
        octets in prop::collection::vec(0..20u8, 1..40)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (service, _durable) = service_with_video().await;
            let mut seen: HashSet<u8> = HashSet::new();

            for octet in octets {
                let ctx = RequestContext::new(format!("203.0.113.{}", octet));
                let outcome = service.record_view("v1", &ctx).await.expect("view");

                if seen.insert(octet) {
                    prop_assert_eq!(outcome, ViewOutcome::Counted(seen.len() as u64));
                } else {
                    prop_assert_eq!(outcome, ViewOutcome::AlreadyCounted(seen.len() as u64));
                }
            }

            let count = service.get_view_count("v1").await.expect("read");
            prop_assert_eq!(count, seen.len() as u64);
            service.shutdown().await;
            Ok(())
        })?;
    }
}

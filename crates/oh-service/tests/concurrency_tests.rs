//! Concurrency tests: the keyed-lock discipline around clean-up+apply and
//! pop-head windows.
//!
//! These drive real task interleavings over the mock store and assert the
//! end-state invariants rather than any particular winner.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use common::types::{Presence, SessionStatus};
use oh_service::coordinator::PresenceOpts;
use oh_test_utils::fixtures::ADMIN;
use oh_test_utils::{uid, TestBed};
use std::sync::Arc;

/// Count the memberships participant `id` holds across the given owners.
fn membership_count(bed: &TestBed, id: &str, owners: &[&str]) -> usize {
    let mut count = 0;
    for owner in owners {
        if bed
            .store
            .zset_members(&format!("oh:{owner}:queue"))
            .iter()
            .any(|m| m == id)
        {
            count += 1;
        }
        if bed.store.set_contains(&format!("oh:{owner}:call"), id) {
            count += 1;
        }
    }
    count
}

#[tokio::test]
async fn test_concurrent_transitions_leave_single_membership() {
    let bed = TestBed::new();
    bed.activate("200").await;
    bed.activate("300").await;

    let mut handles = Vec::new();
    for i in 0..20 {
        let coordinator = Arc::clone(&bed.coordinator);
        let owner = if i % 2 == 0 { "200" } else { "300" };
        handles.push(tokio::spawn(async move {
            coordinator
                .set_presence(
                    &uid("101"),
                    &uid("101"),
                    Presence::InQueue,
                    PresenceOpts::for_owner(uid(owner)),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Indexed under exactly one owner, and the record agrees with the
    // index.
    assert_eq!(membership_count(&bed, "101", &["200", "300"]), 1);
    let record = bed.coordinator.participant(&uid("101")).await.unwrap();
    assert_eq!(record.presence, Presence::InQueue);
    let owner = record.owner.unwrap();
    assert_eq!(
        bed.store.zset_members(&format!("oh:{owner}:queue")),
        vec!["101".to_string()]
    );
}

#[tokio::test]
async fn test_concurrent_admits_admit_exactly_once() {
    let bed = TestBed::new();
    bed.activate("200").await;
    bed.enqueue("101", "200").await;

    let first = {
        let coordinator = Arc::clone(&bed.coordinator);
        tokio::spawn(async move {
            coordinator
                .admit_next(&uid(ADMIN), &uid("200"), None)
                .await
        })
    };
    let second = {
        let coordinator = Arc::clone(&bed.coordinator);
        tokio::spawn(async move {
            coordinator
                .admit_next(&uid(ADMIN), &uid("200"), None)
                .await
        })
    };

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    let admitted: Vec<_> = [first, second].into_iter().flatten().collect();
    assert_eq!(admitted.len(), 1, "one queued participant, one admission");
    assert_eq!(admitted[0].user, uid("101"));
    assert!(bed.store.zset_members("oh:200:queue").is_empty());
    assert_eq!(
        bed.coordinator.call_roster(&uid("200")).await.unwrap(),
        vec![uid("101")]
    );
}

#[tokio::test]
async fn test_concurrent_enqueues_all_land_with_distinct_stamps() {
    let bed = TestBed::new();
    bed.activate("200").await;

    let participants: Vec<String> = (0..10).map(|i| format!("3{i:02}")).collect();
    let mut handles = Vec::new();
    for participant in &participants {
        let coordinator = Arc::clone(&bed.coordinator);
        let participant = participant.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .set_presence(
                    &uid(&participant),
                    &uid(&participant),
                    Presence::InQueue,
                    PresenceOpts::for_owner(uid("200")),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let queue = bed.store.zset_members("oh:200:queue");
    assert_eq!(queue.len(), participants.len());

    let mut scores: Vec<i64> = queue
        .iter()
        .map(|m| bed.store.zset_score("oh:200:queue", m).unwrap())
        .collect();
    let total = scores.len();
    scores.sort_unstable();
    scores.dedup();
    assert_eq!(scores.len(), total, "enqueue stamps must be distinct");
}

#[tokio::test]
async fn test_enqueue_racing_deactivation_leaves_no_stale_entry() {
    for _ in 0..10 {
        let bed = TestBed::new();
        bed.activate("200").await;

        let enqueue = {
            let coordinator = Arc::clone(&bed.coordinator);
            tokio::spawn(async move {
                coordinator
                    .set_presence(
                        &uid("101"),
                        &uid("101"),
                        Presence::InQueue,
                        PresenceOpts::for_owner(uid("200")),
                    )
                    .await
            })
        };
        let deactivate = {
            let coordinator = Arc::clone(&bed.coordinator);
            tokio::spawn(async move {
                coordinator
                    .set_status(&uid(ADMIN), &uid("200"), SessionStatus::Inactive)
                    .await
            })
        };

        // The enqueue either lands before the deactivation (and is
        // evicted) or is rejected with SessionNotActive. Both orders
        // converge to the same end state.
        let _ = enqueue.await.unwrap();
        deactivate.await.unwrap().unwrap();

        assert!(bed.store.zset_members("oh:200:queue").is_empty());
        assert!(!bed.store.set_contains("presence:in_queue", "101"));
        let record = bed.coordinator.participant(&uid("101")).await.unwrap();
        assert_eq!(record.presence, Presence::None);
        assert_eq!(record.owner, None);
    }
}

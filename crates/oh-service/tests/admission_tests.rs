//! FIFO admission and forced queue removal integration tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use common::types::Presence;
use oh_service::coordinator::PresenceOpts;
use oh_service::OhError;
use oh_test_utils::fixtures::{ADMIN, INSTRUCTOR};
use oh_test_utils::{uid, TestBed};

#[tokio::test]
async fn test_admit_moves_head_to_call() {
    let bed = TestBed::new();
    bed.activate("200").await;
    bed.enqueue("101", "200").await;
    assert_eq!(bed.store.zset_members("oh:200:queue").len(), 1);

    let admission = bed
        .coordinator
        .admit_next(&uid(INSTRUCTOR), &uid("200"), None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(admission.user, uid("101"));
    assert_eq!(admission.owner, uid("200"));
    assert_eq!(admission.call_id, "call:200");

    assert!(bed.store.zset_members("oh:200:queue").is_empty());
    assert!(bed.store.set_contains("oh:200:call", "101"));
    assert!(!bed.store.set_contains("presence:in_queue", "101"));
    assert!(bed.store.set_contains("presence:in_call", "101"));

    let record = bed.coordinator.participant(&uid("101")).await.unwrap();
    assert_eq!(record.presence, Presence::InCall);
    assert_eq!(record.owner, Some(uid("200")));
    assert_eq!(record.call_id.as_deref(), Some("call:200"));
}

#[tokio::test]
async fn test_admit_follows_fifo_order() {
    let bed = TestBed::new();
    bed.activate("200").await;
    bed.enqueue("101", "200").await;
    bed.enqueue("103", "200").await;
    bed.enqueue("105", "200").await;

    let first = bed
        .coordinator
        .admit_next(&uid(ADMIN), &uid("200"), None)
        .await
        .unwrap()
        .unwrap();
    let second = bed
        .coordinator
        .admit_next(&uid(ADMIN), &uid("200"), None)
        .await
        .unwrap()
        .unwrap();
    let third = bed
        .coordinator
        .admit_next(&uid(ADMIN), &uid("200"), None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.user, uid("101"));
    assert_eq!(second.user, uid("103"));
    assert_eq!(third.user, uid("105"));

    let empty = bed
        .coordinator
        .admit_next(&uid(ADMIN), &uid("200"), None)
        .await
        .unwrap();
    assert!(empty.is_none());
}

#[tokio::test]
async fn test_admit_respects_requeue_back_of_line() {
    let bed = TestBed::new();
    bed.activate("200").await;
    bed.enqueue("101", "200").await;
    bed.enqueue("103", "200").await;
    bed.enqueue("101", "200").await; // re-stamp: 101 moves behind 103

    let first = bed
        .coordinator
        .admit_next(&uid(ADMIN), &uid("200"), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.user, uid("103"));
}

#[tokio::test]
async fn test_admit_empty_queue_returns_none_with_zero_writes() {
    let bed = TestBed::new();
    bed.activate("200").await;
    let before = bed.store.write_count();

    let result = bed
        .coordinator
        .admit_next(&uid(ADMIN), &uid("200"), None)
        .await
        .unwrap();

    assert!(result.is_none());
    assert_eq!(bed.store.write_count(), before);
}

#[tokio::test]
async fn test_owner_may_admit_in_own_session() {
    let bed = TestBed::new();
    bed.activate("200").await;
    bed.enqueue("101", "200").await;

    let admission = bed
        .coordinator
        .admit_next(&uid("200"), &uid("200"), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admission.user, uid("101"));
}

#[tokio::test]
async fn test_non_elevated_non_owner_admit_is_rejected() {
    let bed = TestBed::new();
    bed.activate("200").await;
    bed.enqueue("101", "200").await;
    let before = bed.store.write_count();

    let result = bed
        .coordinator
        .admit_next(&uid("103"), &uid("200"), None)
        .await;

    assert!(matches!(result, Err(OhError::Unauthorized(_))));
    assert_eq!(bed.store.write_count(), before);
    assert_eq!(bed.store.zset_members("oh:200:queue"), vec!["101"]);
}

#[tokio::test]
async fn test_admit_honors_supplied_call_id() {
    let bed = TestBed::new();
    bed.activate("200").await;
    bed.enqueue("101", "200").await;

    let admission = bed
        .coordinator
        .admit_next(&uid(ADMIN), &uid("200"), Some("breakout-7".to_string()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(admission.call_id, "breakout-7");
    assert_eq!(
        bed.store.hash_field("user:101", "call_id").as_deref(),
        Some("breakout-7")
    );
}

#[tokio::test]
async fn test_admit_drops_entry_not_backed_by_record() {
    let bed = TestBed::new();
    bed.activate("200").await;
    bed.enqueue("103", "200").await;

    // Seed an orphaned head entry: present in the queue index but the
    // participant record never entered the queue.
    use oh_service::store::StateStore;
    bed.store.zset_add("oh:200:queue", 1, "999").await.unwrap();

    let admission = bed
        .coordinator
        .admit_next(&uid(ADMIN), &uid("200"), None)
        .await
        .unwrap()
        .unwrap();

    // The orphan is dropped, the legitimate entry is admitted.
    assert_eq!(admission.user, uid("103"));
    assert!(bed.store.zset_members("oh:200:queue").is_empty());
    let record = bed.coordinator.participant(&uid("999")).await.unwrap();
    assert_eq!(record.presence, Presence::None);
}

#[tokio::test]
async fn test_remove_from_queue_clears_every_index() {
    let bed = TestBed::new();
    bed.activate("200").await;
    bed.enqueue("101", "200").await;

    bed.coordinator
        .remove_from_queue(&uid(ADMIN), &uid("200"), &uid("101"))
        .await
        .unwrap();

    assert!(bed.store.zset_members("oh:200:queue").is_empty());
    assert!(!bed.store.set_contains("presence:in_queue", "101"));
    assert!(!bed.store.set_contains("room:200:members", "101"));
    let record = bed.coordinator.participant(&uid("101")).await.unwrap();
    assert_eq!(record.presence, Presence::None);
    assert_eq!(record.owner, None);
}

#[tokio::test]
async fn test_remove_from_queue_owner_allowed_non_elevated_rejected() {
    let bed = TestBed::new();
    bed.activate("200").await;
    bed.enqueue("101", "200").await;

    let result = bed
        .coordinator
        .remove_from_queue(&uid("103"), &uid("200"), &uid("101"))
        .await;
    assert!(matches!(result, Err(OhError::Unauthorized(_))));
    assert_eq!(bed.store.zset_members("oh:200:queue"), vec!["101"]);

    bed.coordinator
        .remove_from_queue(&uid("200"), &uid("200"), &uid("101"))
        .await
        .unwrap();
    assert!(bed.store.zset_members("oh:200:queue").is_empty());
}

#[tokio::test]
async fn test_remove_from_queue_resets_record_even_when_in_call() {
    let bed = TestBed::new();
    bed.activate("200").await;
    bed.coordinator
        .set_presence(
            &uid("101"),
            &uid("101"),
            Presence::InCall,
            PresenceOpts::for_owner(uid("200")),
        )
        .await
        .unwrap();

    // The reset is unconditional, and it clears whatever membership the
    // record names so no index is left stale.
    bed.coordinator
        .remove_from_queue(&uid(ADMIN), &uid("200"), &uid("101"))
        .await
        .unwrap();

    let record = bed.coordinator.participant(&uid("101")).await.unwrap();
    assert_eq!(record.presence, Presence::None);
    assert!(!bed.store.set_contains("oh:200:call", "101"));
    assert!(!bed.store.set_contains("presence:in_call", "101"));
}

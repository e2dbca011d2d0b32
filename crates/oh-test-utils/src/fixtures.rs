//! Pre-wired coordinator test beds and deterministic fixtures.
//!
//! The stock cast used across the coordinator test suites: `1` is an
//! administrator, `102` is an instructor (elevated via group), `200` is a
//! session owner, and `101`/`103` are plain participants.

use crate::mock_store::MockStore;
use common::types::{SessionStatus, UserId};
use oh_service::clock::Clock;
use oh_service::coordinator::Coordinator;
use oh_service::identity::StaticRoster;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Administrator id seeded into every test bed.
pub const ADMIN: &str = "1";

/// Instructor id (elevated via group membership) seeded into every test bed.
pub const INSTRUCTOR: &str = "102";

/// Parse a test id, panicking on invalid input (test helper).
#[must_use]
pub fn uid(raw: &str) -> UserId {
    UserId::new(raw).expect("valid test id")
}

/// Deterministic clock: starts at a fixed epoch and advances one
/// millisecond per read, so consecutive stamps are distinct and
/// predictable.
#[derive(Debug)]
pub struct FakeClock {
    now: AtomicI64,
}

impl FakeClock {
    /// Clock starting at `start_millis`.
    #[must_use]
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    /// Jump forward by `millis`.
    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    /// Current reading without advancing.
    #[must_use]
    pub fn peek(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(1_000_000)
    }
}

impl Clock for FakeClock {
    fn now_millis(&self) -> i64 {
        self.now.fetch_add(1, Ordering::SeqCst)
    }
}

/// A coordinator wired to a mock store, a deterministic clock, and the
/// stock cast roster.
pub struct TestBed {
    /// The backing mock store (shared with the coordinator).
    pub store: MockStore,
    /// The deterministic clock (shared with the coordinator).
    pub clock: Arc<FakeClock>,
    /// Coordinator under test, shareable across spawned tasks.
    pub coordinator: Arc<Coordinator<MockStore, StaticRoster>>,
}

impl TestBed {
    /// Build a test bed with the stock cast.
    #[must_use]
    pub fn new() -> Self {
        let store = MockStore::new();
        let clock = Arc::new(FakeClock::default());
        let roster = StaticRoster::new()
            .with_admin(uid(ADMIN))
            .with_group_member("instructors", uid(INSTRUCTOR));
        let coordinator = Arc::new(
            Coordinator::new(Arc::new(store.clone()), Arc::new(roster))
                .with_clock(Arc::clone(&clock) as Arc<dyn Clock>),
        );
        Self {
            store,
            clock,
            coordinator,
        }
    }

    /// Activate `owner`'s session as the administrator.
    pub async fn activate(&self, owner: &str) {
        self.coordinator
            .set_status(&uid(ADMIN), &uid(owner), SessionStatus::Active)
            .await
            .expect("activate session");
    }

    /// Self-enqueue `user` into `owner`'s session.
    pub async fn enqueue(&self, user: &str, owner: &str) {
        use oh_service::coordinator::PresenceOpts;
        self.coordinator
            .set_presence(
                &uid(user),
                &uid(user),
                common::types::Presence::InQueue,
                PresenceOpts::for_owner(uid(owner)),
            )
            .await
            .expect("enqueue participant");
    }
}

impl Default for TestBed {
    fn default() -> Self {
        Self::new()
    }
}

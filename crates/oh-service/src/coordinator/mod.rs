//! Presence/queue coordination over the shared store.
//!
//! The [`Coordinator`] owns the presence state machine, FIFO admission, and
//! session lifecycle for the office-hours feature. All state lives in the
//! external store; the coordinator holds only collaborator handles and its
//! keyed locks, so any number of instances over the same store behave as one
//! (subject to the per-process lock scope documented in `locks`).
//!
//! Every public mutation follows the same shape: authorize, validate,
//! read current state, clean up stale membership, apply the new state.
//! Multi-key sequences are composed of idempotent sub-steps; re-running a
//! partially failed sequence converges to the same end state.
//!
//! # Modules
//!
//! - [`presence`] - the presence transition engine (`set_presence`)
//! - [`admission`] - FIFO admission and forced queue removal
//! - [`lifecycle`] - session activation, deactivation, bootstrap

pub mod admission;
pub mod lifecycle;
pub mod presence;

use crate::authz::AuthzGate;
use crate::clock::{Clock, MonotonicClock};
use crate::errors::OhError;
use crate::identity::IdentityProvider;
use crate::locks::KeyedLocks;
use crate::record::{self, ParticipantRecord};
use crate::store::{keys, StateStore};
use common::types::{Presence, SessionStatus, UserId};
use serde::Serialize;
use std::sync::Arc;

/// Options for a presence transition.
#[derive(Debug, Default, Clone)]
pub struct PresenceOpts {
    /// Session owner to queue/call under. Required for `InQueue`/`InCall`.
    pub owner: Option<UserId>,
    /// Call token to record. Defaults to one derived from the owner id.
    pub call_id: Option<String>,
}

impl PresenceOpts {
    /// Options targeting `owner`'s session with a derived call id.
    #[must_use]
    pub fn for_owner(owner: UserId) -> Self {
        Self {
            owner: Some(owner),
            call_id: None,
        }
    }
}

/// Result of a presence transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceReceipt {
    /// Participant whose presence changed.
    pub user: UserId,
    /// Presence after the transition.
    pub presence: Presence,
    /// Session the participant is now queued/called under.
    pub owner: Option<UserId>,
    /// Call token, set only when now in a call.
    pub call_id: Option<String>,
}

/// Result of admitting the head of a queue into the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Admission {
    /// Admitted participant.
    pub user: UserId,
    /// Session owner whose queue was popped.
    pub owner: UserId,
    /// Call token recorded for the admitted participant.
    pub call_id: String,
}

/// Result of a session status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    /// Session owner.
    pub owner: UserId,
    /// Status after the change.
    pub status: SessionStatus,
    /// Participants evicted by a deactivation (0 on activation).
    pub affected: usize,
}

/// Presence, admission, and lifecycle coordinator.
///
/// Generic over the store and identity collaborators; both are injected
/// explicitly rather than reached through globals.
pub struct Coordinator<S, I> {
    store: Arc<S>,
    gate: AuthzGate<I>,
    clock: Arc<dyn Clock>,
    participant_locks: KeyedLocks,
    owner_locks: KeyedLocks,
}

impl<S: StateStore, I: IdentityProvider> Coordinator<S, I> {
    /// Create a coordinator with the default elevated groups and a
    /// monotonic system clock.
    #[must_use]
    pub fn new(store: Arc<S>, identity: Arc<I>) -> Self {
        Self {
            store,
            gate: AuthzGate::new(identity),
            clock: Arc::new(MonotonicClock::default()),
            participant_locks: KeyedLocks::new(),
            owner_locks: KeyedLocks::new(),
        }
    }

    /// Replace the elevated group set.
    #[must_use]
    pub fn with_elevated_groups(mut self, groups: Vec<String>) -> Self {
        self.gate = self.gate.with_elevated_groups(groups);
        self
    }

    /// Replace the timestamp source (tests inject a deterministic clock).
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ------------------------------------------------------------------
    // Read surface: no authorization requirement, no writes.
    // ------------------------------------------------------------------

    /// Current record for one participant. An unknown id reads as the
    /// lazy-creation default (presence `none`).
    ///
    /// # Errors
    ///
    /// `Store` on store failure; `InvalidArgument` if the stored record is
    /// corrupt.
    pub async fn participant(&self, id: &UserId) -> Result<ParticipantRecord, OhError> {
        self.read_record(id).await
    }

    /// FIFO-ordered wait queue for `owner`'s session.
    ///
    /// # Errors
    ///
    /// `Store` on store failure; `InvalidArgument` if a stored member id is
    /// corrupt.
    pub async fn queue(&self, owner: &UserId) -> Result<Vec<UserId>, OhError> {
        let raw = self.store.zset_range(&keys::queue(owner), 0, -1).await?;
        raw.into_iter()
            .map(|member| UserId::new(member).map_err(OhError::from))
            .collect()
    }

    /// Participants currently in `owner`'s call, sorted for determinism.
    ///
    /// # Errors
    ///
    /// `Store` on store failure; `InvalidArgument` if a stored member id is
    /// corrupt.
    pub async fn call_roster(&self, owner: &UserId) -> Result<Vec<UserId>, OhError> {
        let mut raw = self.store.set_members(&keys::call(owner)).await?;
        raw.sort_unstable();
        raw.into_iter()
            .map(|member| UserId::new(member).map_err(OhError::from))
            .collect()
    }

    /// Session status for `owner`. A session never written reads as
    /// `Inactive`.
    ///
    /// # Errors
    ///
    /// `Store` on store failure; `InvalidArgument` if the stored status is
    /// corrupt.
    pub async fn session_status(&self, owner: &UserId) -> Result<SessionStatus, OhError> {
        match self.store.get(&keys::session_status(owner)).await? {
            Some(raw) => Ok(raw.parse::<SessionStatus>()?),
            None => Ok(SessionStatus::Inactive),
        }
    }

    // ------------------------------------------------------------------
    // Shared internals.
    // ------------------------------------------------------------------

    pub(crate) async fn read_record(&self, id: &UserId) -> Result<ParticipantRecord, OhError> {
        let fields = self.store.hash_get_all(&keys::user(id)).await?;
        Ok(ParticipantRecord::from_fields(&fields)?)
    }

    /// Fail with `SessionNotActive` unless `owner`'s session is active.
    pub(crate) async fn require_active(&self, owner: &UserId) -> Result<(), OhError> {
        match self.session_status(owner).await? {
            SessionStatus::Active => Ok(()),
            SessionStatus::Inactive => Err(OhError::SessionNotActive(owner.to_string())),
        }
    }

    /// Remove `target` from whatever membership its record names: the
    /// previous owner's queue or call roster, the matching global index,
    /// and the previous owner's membership set.
    ///
    /// Idempotent; every removal is a no-op when already absent. Caller
    /// holds the participant lock.
    pub(crate) async fn clear_membership(
        &self,
        target: &UserId,
        current: &ParticipantRecord,
    ) -> Result<(), OhError> {
        let Some(prev_owner) = &current.owner else {
            return Ok(());
        };
        match current.presence {
            Presence::InQueue => {
                self.store
                    .zset_remove(&keys::queue(prev_owner), target.as_str())
                    .await?;
                self.store
                    .set_remove(keys::IN_QUEUE_SET, target.as_str())
                    .await?;
                self.store
                    .set_remove(&keys::room_members(prev_owner), target.as_str())
                    .await?;
            }
            Presence::InCall => {
                self.store
                    .set_remove(&keys::call(prev_owner), target.as_str())
                    .await?;
                self.store
                    .set_remove(keys::IN_CALL_SET, target.as_str())
                    .await?;
                self.store
                    .set_remove(&keys::room_members(prev_owner), target.as_str())
                    .await?;
            }
            Presence::None => {}
        }
        Ok(())
    }

    /// Reset `target`'s record to presence `none`. Idempotent. Caller holds
    /// the participant lock.
    pub(crate) async fn write_none(&self, target: &UserId) -> Result<(), OhError> {
        let now = self.clock.now_millis();
        let key = keys::user(target);
        self.store
            .hash_set(
                &key,
                &[
                    (record::FIELD_PRESENCE, Presence::None.as_str().to_string()),
                    (record::FIELD_UPDATED_AT, now.to_string()),
                ],
            )
            .await?;
        self.store
            .hash_delete_fields(&key, &[record::FIELD_ROOM_OWNER, record::FIELD_CALL_ID])
            .await?;
        Ok(())
    }

    /// Call token derived from the owner id when none is supplied.
    pub(crate) fn derived_call_id(owner: &UserId) -> String {
        format!("call:{owner}")
    }
}

//! Session lifecycle: activation, deactivation, bootstrap.
//!
//! Deactivation is the one bulk operation in the system: every queued and
//! in-call participant of the owner is evicted and reset. The eviction
//! walks the membership union with per-participant idempotent resets, then
//! deletes the per-owner structures, so a re-run after a partial failure
//! converges (the member list survives until every reset has succeeded).

use super::{Coordinator, StatusChange};
use crate::errors::OhError;
use crate::identity::IdentityProvider;
use crate::observability::metrics;
use crate::record;
use crate::store::{keys, StateStore};
use common::types::{SessionStatus, UserId};
use std::collections::BTreeSet;
use tracing::{info, instrument};

impl<S: StateStore, I: IdentityProvider> Coordinator<S, I> {
    /// Set `owner`'s session status.
    ///
    /// Elevated actors only; the owner holds no implicit right over their
    /// own session's status. On a transition to `Inactive` every queued and
    /// in-call participant is evicted and reset to presence `none`;
    /// `affected` reports how many.
    ///
    /// # Errors
    ///
    /// `Unauthorized` if `actor` is not elevated; `Store` on store failure.
    #[instrument(
        skip(self),
        name = "oh.set_status",
        fields(actor = %actor, owner = %owner, status = %status)
    )]
    pub async fn set_status(
        &self,
        actor: &UserId,
        owner: &UserId,
        status: SessionStatus,
    ) -> Result<StatusChange, OhError> {
        if !self.gate.can_set_status(actor).await {
            metrics::record_status_change(status, "unauthorized");
            return Err(OhError::Unauthorized(format!(
                "actor {actor} may not change session status"
            )));
        }
        let result = self.apply_status(owner, status).await;
        match &result {
            Ok(change) => {
                metrics::record_status_change(status, "applied");
                info!(affected = change.affected, "session status changed");
            }
            Err(e) => metrics::record_status_change(status, e.error_type_label()),
        }
        result
    }

    async fn apply_status(
        &self,
        owner: &UserId,
        status: SessionStatus,
    ) -> Result<StatusChange, OhError> {
        let _owner_guard = self.owner_locks.acquire(owner.as_str()).await;
        let affected = match status {
            SessionStatus::Active => {
                self.write_status_locked(owner, SessionStatus::Active).await?;
                0
            }
            SessionStatus::Inactive => self.force_inactive_locked(owner, "deactivate").await?,
        };
        Ok(StatusChange {
            owner: owner.clone(),
            status,
            affected,
        })
    }

    /// Administrative reset for initialization or recovery: force the
    /// session to `Inactive` and clear its queue, call roster, and
    /// membership structures, resetting every member's record on the way.
    ///
    /// Not actor-gated; this is invoked by deployment and recovery code,
    /// never mapped to a transport call. Returns the number of participants
    /// reset.
    ///
    /// # Errors
    ///
    /// `Store` on store failure.
    #[instrument(skip(self), name = "oh.bootstrap", fields(owner = %owner))]
    pub async fn bootstrap(&self, owner: &UserId) -> Result<usize, OhError> {
        let _owner_guard = self.owner_locks.acquire(owner.as_str()).await;
        let affected = self.force_inactive_locked(owner, "bootstrap").await?;
        info!(affected, "session bootstrapped");
        Ok(affected)
    }

    /// Write the status scalar and mirror it onto the owner's record.
    /// Caller holds the owner lock.
    async fn write_status_locked(
        &self,
        owner: &UserId,
        status: SessionStatus,
    ) -> Result<(), OhError> {
        self.store
            .set(&keys::session_status(owner), status.as_str())
            .await?;
        let now = self.clock.now_millis();
        self.store
            .hash_set(
                &keys::user(owner),
                &[
                    (record::FIELD_OH_STATUS, status.as_str().to_string()),
                    (record::FIELD_UPDATED_AT, now.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    /// Deactivate and evict. Caller holds the owner lock.
    ///
    /// Order matters for re-runnability: the status flips first (no new
    /// entries can land), member records are reset one by one, and the
    /// per-owner structures are deleted last, so a partial failure leaves
    /// the member list readable for the retry.
    async fn force_inactive_locked(
        &self,
        owner: &UserId,
        reason: &'static str,
    ) -> Result<usize, OhError> {
        self.write_status_locked(owner, SessionStatus::Inactive).await?;

        let call_members = self.store.set_members(&keys::call(owner)).await?;
        let queue_members = self.store.zset_range(&keys::queue(owner), 0, -1).await?;
        let room_members = self.store.set_members(&keys::room_members(owner)).await?;
        let members: BTreeSet<String> = call_members
            .into_iter()
            .chain(queue_members)
            .chain(room_members)
            .collect();

        let mut affected = 0;
        for raw in &members {
            let target = UserId::new(raw.clone())?;
            if self.evict_member(owner, &target).await? {
                affected += 1;
            }
        }

        self.store.delete(&keys::call(owner)).await?;
        self.store.delete(&keys::queue(owner)).await?;
        self.store.delete(&keys::room_members(owner)).await?;

        metrics::record_evictions(reason, affected);
        Ok(affected)
    }

    /// Reset one member during bulk eviction. Returns whether the member
    /// was still homed here; a participant who re-homed to another session
    /// between the member-list read and this reset is left alone.
    async fn evict_member(&self, owner: &UserId, target: &UserId) -> Result<bool, OhError> {
        let _participant_guard = self.participant_locks.acquire(target.as_str()).await;
        let current = self.read_record(target).await?;
        if current.owner.as_ref() != Some(owner) {
            return Ok(false);
        }
        self.clear_membership(target, &current).await?;
        self.write_none(target).await?;
        Ok(true)
    }
}

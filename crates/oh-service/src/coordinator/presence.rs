//! Presence transition engine.
//!
//! One state machine per participant: `none`, `in_queue`, `in_call`.
//! Transitions clean up the previous membership before applying the new
//! one, so a participant is indexed under at most one owner at a time.
//!
//! Re-entering the current state is not a no-op: the clean-up/apply pair
//! re-stamps the enqueue timestamp, which moves the participant to the back
//! of the FIFO. That is deliberate and covered by tests.

use super::{Coordinator, PresenceOpts, PresenceReceipt};
use crate::errors::OhError;
use crate::identity::IdentityProvider;
use crate::observability::metrics;
use crate::record;
use crate::store::{keys, StateStore};
use common::types::{Presence, UserId};
use tracing::{info, instrument};

impl<S: StateStore, I: IdentityProvider> Coordinator<S, I> {
    /// Move `target` to `next` presence.
    ///
    /// - `InQueue`/`InCall` require `opts.owner` and an active session for
    ///   that owner.
    /// - `InCall` records `opts.call_id`, or a token derived from the owner
    ///   id when not supplied.
    /// - `None` clears the owner and call token.
    ///
    /// Authorization, argument validation, and the active-session
    /// precondition are all checked before any write: a rejected transition
    /// leaves every structure untouched, including the participant's
    /// previous membership.
    ///
    /// # Errors
    ///
    /// `Unauthorized` if `actor` is neither `target` nor elevated;
    /// `InvalidArgument` if `opts.owner` is missing for `InQueue`/`InCall`;
    /// `SessionNotActive` if the target session is not active; `Store` on
    /// store failure.
    #[instrument(
        skip(self, opts),
        name = "oh.set_presence",
        fields(actor = %actor, target = %target, next = %next)
    )]
    pub async fn set_presence(
        &self,
        actor: &UserId,
        target: &UserId,
        next: Presence,
        opts: PresenceOpts,
    ) -> Result<PresenceReceipt, OhError> {
        if !self.gate.can_set_presence(actor, target).await {
            metrics::record_transition(next, "unauthorized");
            return Err(OhError::Unauthorized(format!(
                "actor {actor} may not change presence of {target}"
            )));
        }
        let result = self.apply_presence(target, next, opts).await;
        match &result {
            Ok(receipt) => {
                metrics::record_transition(next, "applied");
                info!(
                    user = %receipt.user,
                    presence = %receipt.presence,
                    owner = receipt.owner.as_ref().map(UserId::as_str),
                    "presence updated"
                );
            }
            Err(e) => metrics::record_transition(next, e.error_type_label()),
        }
        result
    }

    async fn apply_presence(
        &self,
        target: &UserId,
        next: Presence,
        opts: PresenceOpts,
    ) -> Result<PresenceReceipt, OhError> {
        match next {
            Presence::InQueue => self.apply_enqueue(target, opts).await,
            Presence::InCall => self.apply_join_call(target, opts).await,
            Presence::None => self.apply_leave(target).await,
        }
    }

    async fn apply_enqueue(
        &self,
        target: &UserId,
        opts: PresenceOpts,
    ) -> Result<PresenceReceipt, OhError> {
        let owner = opts.owner.ok_or_else(|| {
            OhError::InvalidArgument("owner id required to enter a queue".to_string())
        })?;
        let _owner_guard = self.owner_locks.acquire(owner.as_str()).await;
        let _participant_guard = self.participant_locks.acquire(target.as_str()).await;
        self.require_active(&owner).await?;

        let previous = self.read_record(target).await?;
        self.clear_membership(target, &previous).await?;

        let now = self.clock.now_millis();
        self.store
            .zset_add(&keys::queue(&owner), now, target.as_str())
            .await?;
        self.store
            .set_add(keys::IN_QUEUE_SET, target.as_str())
            .await?;
        self.store
            .set_add(&keys::room_members(&owner), target.as_str())
            .await?;
        let user_key = keys::user(target);
        self.store
            .hash_set(
                &user_key,
                &[
                    (record::FIELD_PRESENCE, Presence::InQueue.as_str().to_string()),
                    (record::FIELD_ROOM_OWNER, owner.to_string()),
                    (record::FIELD_UPDATED_AT, now.to_string()),
                ],
            )
            .await?;
        // A call token never survives outside a call.
        self.store
            .hash_delete_fields(&user_key, &[record::FIELD_CALL_ID])
            .await?;

        Ok(PresenceReceipt {
            user: target.clone(),
            presence: Presence::InQueue,
            owner: Some(owner),
            call_id: None,
        })
    }

    async fn apply_join_call(
        &self,
        target: &UserId,
        opts: PresenceOpts,
    ) -> Result<PresenceReceipt, OhError> {
        let owner = opts.owner.ok_or_else(|| {
            OhError::InvalidArgument("owner id required to enter a call".to_string())
        })?;
        let call_id = opts
            .call_id
            .unwrap_or_else(|| Self::derived_call_id(&owner));
        let _owner_guard = self.owner_locks.acquire(owner.as_str()).await;
        let _participant_guard = self.participant_locks.acquire(target.as_str()).await;
        self.require_active(&owner).await?;

        let previous = self.read_record(target).await?;
        self.clear_membership(target, &previous).await?;

        let now = self.clock.now_millis();
        self.store
            .set_add(&keys::call(&owner), target.as_str())
            .await?;
        self.store
            .set_add(keys::IN_CALL_SET, target.as_str())
            .await?;
        self.store
            .set_add(&keys::room_members(&owner), target.as_str())
            .await?;
        self.store
            .hash_set(
                &keys::user(target),
                &[
                    (record::FIELD_PRESENCE, Presence::InCall.as_str().to_string()),
                    (record::FIELD_ROOM_OWNER, owner.to_string()),
                    (record::FIELD_CALL_ID, call_id.clone()),
                    (record::FIELD_UPDATED_AT, now.to_string()),
                ],
            )
            .await?;

        Ok(PresenceReceipt {
            user: target.clone(),
            presence: Presence::InCall,
            owner: Some(owner),
            call_id: Some(call_id),
        })
    }

    async fn apply_leave(&self, target: &UserId) -> Result<PresenceReceipt, OhError> {
        let _participant_guard = self.participant_locks.acquire(target.as_str()).await;

        let previous = self.read_record(target).await?;
        self.clear_membership(target, &previous).await?;
        self.write_none(target).await?;

        Ok(PresenceReceipt {
            user: target.clone(),
            presence: Presence::None,
            owner: None,
            call_id: None,
        })
    }
}

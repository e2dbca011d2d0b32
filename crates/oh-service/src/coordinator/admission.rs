//! FIFO admission and forced queue removal.
//!
//! `admit_next` pops the entry with the smallest enqueue timestamp and
//! enrolls it in the call roster. Admissions for one owner are serialized
//! by the owner lock, so two concurrent admits can never read the same head
//! entry.

use super::{Admission, Coordinator};
use crate::errors::OhError;
use crate::identity::IdentityProvider;
use crate::observability::metrics;
use crate::record;
use crate::store::{keys, StateStore};
use common::types::{Presence, UserId};
use tracing::{info, instrument, warn};

impl<S: StateStore, I: IdentityProvider> Coordinator<S, I> {
    /// Admit the longest-waiting queued participant into `owner`'s call.
    ///
    /// Returns `Ok(None)` on an empty queue, with zero writes. The call
    /// token is `call_id`, or one derived from the owner id when not
    /// supplied.
    ///
    /// # Errors
    ///
    /// `Unauthorized` if `actor` is neither elevated nor `owner`; `Store`
    /// on store failure; `InvalidArgument` if the store holds a corrupt
    /// member id.
    #[instrument(
        skip(self, call_id),
        name = "oh.admit_next",
        fields(actor = %actor, owner = %owner)
    )]
    pub async fn admit_next(
        &self,
        actor: &UserId,
        owner: &UserId,
        call_id: Option<String>,
    ) -> Result<Option<Admission>, OhError> {
        if !self.gate.can_admit(actor, owner).await {
            metrics::record_admission("unauthorized");
            return Err(OhError::Unauthorized(format!(
                "actor {actor} may not admit for session {owner}"
            )));
        }
        let result = self.pop_and_enroll(owner, call_id).await;
        match &result {
            Ok(Some(admission)) => {
                metrics::record_admission("admitted");
                info!(user = %admission.user, call_id = %admission.call_id, "admitted from queue");
            }
            Ok(None) => metrics::record_admission("empty"),
            Err(e) => metrics::record_admission(e.error_type_label()),
        }
        result
    }

    async fn pop_and_enroll(
        &self,
        owner: &UserId,
        call_id: Option<String>,
    ) -> Result<Option<Admission>, OhError> {
        let _owner_guard = self.owner_locks.acquire(owner.as_str()).await;
        loop {
            let head = self.store.zset_range(&keys::queue(owner), 0, 0).await?;
            let Some(raw) = head.into_iter().next() else {
                return Ok(None);
            };
            let target = UserId::new(raw)?;
            let _participant_guard = self.participant_locks.acquire(target.as_str()).await;

            // The head may have left (or re-homed) between the range read
            // and the participant lock; the record is authoritative. Drop
            // the orphaned entry and look again.
            let current = self.read_record(&target).await?;
            if current.presence != Presence::InQueue || current.owner.as_ref() != Some(owner) {
                warn!(user = %target, "dropping queue entry not backed by participant record");
                self.store
                    .zset_remove(&keys::queue(owner), target.as_str())
                    .await?;
                continue;
            }

            let call_id = call_id
                .clone()
                .unwrap_or_else(|| Self::derived_call_id(owner));
            let now = self.clock.now_millis();
            self.store
                .zset_remove(&keys::queue(owner), target.as_str())
                .await?;
            self.store
                .set_remove(keys::IN_QUEUE_SET, target.as_str())
                .await?;
            self.store
                .set_add(&keys::call(owner), target.as_str())
                .await?;
            self.store
                .set_add(keys::IN_CALL_SET, target.as_str())
                .await?;
            self.store
                .set_add(&keys::room_members(owner), target.as_str())
                .await?;
            self.store
                .hash_set(
                    &keys::user(&target),
                    &[
                        (record::FIELD_PRESENCE, Presence::InCall.as_str().to_string()),
                        (record::FIELD_ROOM_OWNER, owner.to_string()),
                        (record::FIELD_CALL_ID, call_id.clone()),
                        (record::FIELD_UPDATED_AT, now.to_string()),
                    ],
                )
                .await?;

            return Ok(Some(Admission {
                user: target,
                owner: owner.clone(),
                call_id,
            }));
        }
    }

    /// Forcibly remove `target` from `owner`'s queue and reset the
    /// participant record to presence `none`.
    ///
    /// The record reset is unconditional: it applies even when the queue
    /// entry was already gone, and it clears whatever membership the record
    /// names so no index is left stale.
    ///
    /// # Errors
    ///
    /// `Unauthorized` if `actor` is neither elevated nor `owner`; `Store`
    /// on store failure.
    #[instrument(
        skip(self),
        name = "oh.remove_from_queue",
        fields(actor = %actor, owner = %owner, target = %target)
    )]
    pub async fn remove_from_queue(
        &self,
        actor: &UserId,
        owner: &UserId,
        target: &UserId,
    ) -> Result<(), OhError> {
        if !self.gate.can_remove_from_queue(actor, owner).await {
            metrics::record_queue_removal("unauthorized");
            return Err(OhError::Unauthorized(format!(
                "actor {actor} may not remove from queue of {owner}"
            )));
        }
        let result = self.force_remove(owner, target).await;
        match &result {
            Ok(()) => {
                metrics::record_queue_removal("removed");
                info!("removed from queue");
            }
            Err(e) => metrics::record_queue_removal(e.error_type_label()),
        }
        result
    }

    async fn force_remove(&self, owner: &UserId, target: &UserId) -> Result<(), OhError> {
        let _owner_guard = self.owner_locks.acquire(owner.as_str()).await;
        let _participant_guard = self.participant_locks.acquire(target.as_str()).await;

        let current = self.read_record(target).await?;
        self.clear_membership(target, &current).await?;

        // Cover record/index drift: the entry may exist even when the
        // record no longer names this owner.
        self.store
            .zset_remove(&keys::queue(owner), target.as_str())
            .await?;
        self.store
            .set_remove(keys::IN_QUEUE_SET, target.as_str())
            .await?;
        self.store
            .set_remove(&keys::room_members(owner), target.as_str())
            .await?;

        self.write_none(target).await
    }
}

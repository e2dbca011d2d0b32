//! Authorization gate.
//!
//! Capability rules:
//! - Self-action is always permitted for presence changes (entering or
//!   leaving a queue or call).
//! - Cross-participant presence changes require elevated status.
//! - Admission and forced queue removal are permitted for elevated actors
//!   and for the session's own owner acting within their own session.
//! - Session status changes require elevated status; a session owner gains
//!   no implicit right over their own session's status.
//!
//! Elevated = administrator, or member of any configured elevated group.
//! The gate only answers yes/no; callers reject with `Unauthorized` and
//! perform no store writes on a negative answer.

use crate::identity::IdentityProvider;
use common::types::UserId;
use std::sync::Arc;

/// Groups whose members hold elevated status when none are configured.
pub const DEFAULT_ELEVATED_GROUPS: [&str; 2] = ["instructors", "oh_managers"];

/// Capability check for presence, admission, and session-status mutations.
#[derive(Debug, Clone)]
pub struct AuthzGate<I> {
    identity: Arc<I>,
    elevated_groups: Vec<String>,
}

impl<I: IdentityProvider> AuthzGate<I> {
    /// Create a gate over `identity` with the default elevated groups.
    #[must_use]
    pub fn new(identity: Arc<I>) -> Self {
        Self {
            identity,
            elevated_groups: DEFAULT_ELEVATED_GROUPS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Replace the elevated group set.
    #[must_use]
    pub fn with_elevated_groups(mut self, groups: Vec<String>) -> Self {
        self.elevated_groups = groups;
        self
    }

    /// Whether `actor` is an administrator or a member of an elevated group.
    pub async fn is_elevated(&self, actor: &UserId) -> bool {
        if self.identity.is_administrator(actor).await {
            return true;
        }
        for group in &self.elevated_groups {
            if self.identity.is_group_member(actor, group).await {
                return true;
            }
        }
        false
    }

    /// May `actor` change `target`'s presence?
    pub async fn can_set_presence(&self, actor: &UserId, target: &UserId) -> bool {
        actor == target || self.is_elevated(actor).await
    }

    /// May `actor` admit the next queued participant for `owner`'s session?
    pub async fn can_admit(&self, actor: &UserId, owner: &UserId) -> bool {
        actor == owner || self.is_elevated(actor).await
    }

    /// May `actor` forcibly remove a participant from `owner`'s queue?
    pub async fn can_remove_from_queue(&self, actor: &UserId, owner: &UserId) -> bool {
        actor == owner || self.is_elevated(actor).await
    }

    /// May `actor` change a session's status?
    pub async fn can_set_status(&self, actor: &UserId) -> bool {
        self.is_elevated(actor).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::identity::StaticRoster;

    fn uid(raw: &str) -> UserId {
        UserId::new(raw).unwrap()
    }

    fn gate() -> AuthzGate<StaticRoster> {
        let roster = StaticRoster::new()
            .with_admin(uid("1"))
            .with_group_member("instructors", uid("102"));
        AuthzGate::new(Arc::new(roster))
    }

    #[tokio::test]
    async fn test_self_presence_always_allowed() {
        assert!(gate().can_set_presence(&uid("101"), &uid("101")).await);
    }

    #[tokio::test]
    async fn test_cross_presence_requires_elevation() {
        let gate = gate();
        assert!(!gate.can_set_presence(&uid("101"), &uid("103")).await);
        assert!(gate.can_set_presence(&uid("1"), &uid("103")).await);
        assert!(gate.can_set_presence(&uid("102"), &uid("103")).await);
    }

    #[tokio::test]
    async fn test_owner_may_admit_and_remove_in_own_session() {
        let gate = gate();
        assert!(gate.can_admit(&uid("200"), &uid("200")).await);
        assert!(gate.can_remove_from_queue(&uid("200"), &uid("200")).await);
        assert!(!gate.can_admit(&uid("200"), &uid("201")).await);
        assert!(!gate.can_remove_from_queue(&uid("200"), &uid("201")).await);
    }

    #[tokio::test]
    async fn test_status_change_has_no_owner_exception() {
        let gate = gate();
        assert!(!gate.can_set_status(&uid("200")).await);
        assert!(gate.can_set_status(&uid("1")).await);
        assert!(gate.can_set_status(&uid("102")).await);
    }

    #[tokio::test]
    async fn test_custom_elevated_groups_replace_defaults() {
        let roster = StaticRoster::new().with_group_member("staff", uid("55"));
        let gate =
            AuthzGate::new(Arc::new(roster)).with_elevated_groups(vec!["staff".to_string()]);
        assert!(gate.is_elevated(&uid("55")).await);

        let roster = StaticRoster::new().with_group_member("instructors", uid("102"));
        let gate =
            AuthzGate::new(Arc::new(roster)).with_elevated_groups(vec!["staff".to_string()]);
        assert!(!gate.is_elevated(&uid("102")).await);
    }
}

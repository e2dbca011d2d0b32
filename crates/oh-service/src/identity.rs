//! Administrator/group-membership collaborator.
//!
//! The authorization gate asks one question of the outside world: does this
//! actor hold elevated status. The answer comes from an injected
//! [`IdentityProvider`] rather than a module-level singleton, so tests and
//! deployments choose the backing themselves.

use async_trait::async_trait;
use common::types::UserId;
use std::collections::{HashMap, HashSet};

/// Read-only identity/role lookups. No side effects.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Whether `actor` is a site administrator.
    async fn is_administrator(&self, actor: &UserId) -> bool;

    /// Whether `actor` is a member of the named group.
    async fn is_group_member(&self, actor: &UserId, group: &str) -> bool;
}

/// Identity provider backed by in-memory rosters.
///
/// Built from configuration by the service binary and used directly by
/// tests.
#[derive(Debug, Default, Clone)]
pub struct StaticRoster {
    admins: HashSet<UserId>,
    groups: HashMap<String, HashSet<UserId>>,
}

impl StaticRoster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an administrator.
    #[must_use]
    pub fn with_admin(mut self, id: UserId) -> Self {
        self.admins.insert(id);
        self
    }

    /// Add a member to a group, creating the group if needed.
    #[must_use]
    pub fn with_group_member(mut self, group: &str, id: UserId) -> Self {
        self.groups.entry(group.to_string()).or_default().insert(id);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticRoster {
    async fn is_administrator(&self, actor: &UserId) -> bool {
        self.admins.contains(actor)
    }

    async fn is_group_member(&self, actor: &UserId, group: &str) -> bool {
        self.groups
            .get(group)
            .is_some_and(|members| members.contains(actor))
    }
}

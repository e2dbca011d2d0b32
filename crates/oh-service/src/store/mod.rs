//! State store capability contract.
//!
//! The coordinator never talks to Redis directly; it goes through the
//! [`StateStore`] trait, which captures exactly the capabilities the
//! coordination core needs: an object map, a scalar, an unordered set, and
//! an ordered set, each atomic per key. There are no cross-key transactions;
//! the coordinator composes multi-key sequences out of idempotent sub-steps
//! and serializes them with [`crate::locks::KeyedLocks`].
//!
//! Production uses [`RedisStore`]; tests use the in-memory mock from
//! `oh-test-utils`.

pub mod keys;
pub mod redis;

pub use self::redis::RedisStore;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Error from a state store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection or command failure.
    #[error("Store I/O error: {0}")]
    Io(String),

    /// The store answered with a reply shape the client did not expect.
    #[error("Unexpected store reply: {0}")]
    UnexpectedReply(String),
}

/// Single-key atomic store operations used by the coordinator.
///
/// Every method suspends only for store I/O. Removal operations are no-ops
/// when the member or field is absent, which is what makes the coordinator's
/// multi-key sequences safely re-runnable after a partial failure.
#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    /// Read all fields of the object map at `key`. Missing key reads as an
    /// empty map.
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Merge `fields` into the object map at `key`, creating it if absent.
    async fn hash_set(&self, key: &str, fields: &[(&str, String)]) -> Result<(), StoreError>;

    /// Delete named fields from the object map at `key`.
    async fn hash_delete_fields(&self, key: &str, fields: &[&str]) -> Result<(), StoreError>;

    /// Read the scalar at `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write the scalar at `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key` (any kind).
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Add `member` to the unordered set at `key`.
    async fn set_add(&self, key: &str, member: &str) -> Result<(), StoreError>;

    /// Remove `member` from the unordered set at `key`.
    async fn set_remove(&self, key: &str, member: &str) -> Result<(), StoreError>;

    /// List members of the unordered set at `key`. Missing key reads as
    /// empty.
    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Add `(score, member)` to the ordered set at `key`, replacing the
    /// member's score if it is already present.
    async fn zset_add(&self, key: &str, score: i64, member: &str) -> Result<(), StoreError>;

    /// Remove `member` from the ordered set at `key`.
    async fn zset_remove(&self, key: &str, member: &str) -> Result<(), StoreError>;

    /// Members of the ordered set at `key` by rank range, ascending score.
    /// `stop = -1` means the last element.
    async fn zset_range(&self, key: &str, start: isize, stop: isize)
        -> Result<Vec<String>, StoreError>;

    /// Liveness check against the store, used by the readiness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

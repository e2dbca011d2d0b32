//! Office Hours coordination service library.
//!
//! Tracks each participant's membership in a session's wait queue or active
//! call over a shared external store, enforces FIFO admission order, gates
//! every mutation behind an authorization check, and guarantees that
//! deactivating a session leaves no stale membership behind.
//!
//! # Modules
//!
//! - `authz` - Authorization gate (self/elevated/owner capability checks)
//! - `clock` - Timestamp source with a strictly monotonic wrapper
//! - `config` - Service configuration
//! - `coordinator` - Presence transitions, admission, session lifecycle
//! - `errors` - Error types
//! - `http` - Ops HTTP surface (health, readiness, metrics)
//! - `identity` - Administrator/group-membership collaborator
//! - `locks` - Per-key serialization for multi-key write sequences
//! - `observability` - Metrics definitions
//! - `record` - Participant record field-map codec
//! - `store` - State store capability contract and Redis implementation

pub mod authz;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod http;
pub mod identity;
pub mod locks;
pub mod observability;
pub mod record;
pub mod store;

pub use coordinator::Coordinator;
pub use errors::OhError;

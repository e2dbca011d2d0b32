//! Store key layout.
//!
//! Office hours state for one owner:
//! - `oh:{owner}:status` - session status (scalar)
//! - `oh:{owner}:queue` - wait queue (ordered set, score = enqueue millis)
//! - `oh:{owner}:call` - call roster (set)
//! - `room:{owner}:members` - queued + in-call union, for bulk deletion
//!
//! Participant state:
//! - `user:{id}` - participant record (object map)
//!
//! Global secondary indices, any owner:
//! - `presence:in_queue`, `presence:in_call`

use common::types::UserId;

/// All participants currently waiting in any queue.
pub const IN_QUEUE_SET: &str = "presence:in_queue";

/// All participants currently in any call.
pub const IN_CALL_SET: &str = "presence:in_call";

/// Participant record key.
#[must_use]
pub fn user(id: &UserId) -> String {
    format!("user:{id}")
}

/// Session status scalar key.
#[must_use]
pub fn session_status(owner: &UserId) -> String {
    format!("oh:{owner}:status")
}

/// Wait queue ordered-set key.
#[must_use]
pub fn queue(owner: &UserId) -> String {
    format!("oh:{owner}:queue")
}

/// Call roster set key.
#[must_use]
pub fn call(owner: &UserId) -> String {
    format!("oh:{owner}:call")
}

/// Owner membership set key (queued and in-call participants).
#[must_use]
pub fn room_members(owner: &UserId) -> String {
    format!("room:{owner}:members")
}

//! Participant record field-map codec.
//!
//! A participant record lives in the store as a plain string field map under
//! `user:{id}`. Records are created lazily on first presence write and are
//! reset, never hard-deleted. The coordinator writes partial patches per
//! transition; this module owns the field names and the read-side decoding.

use common::types::{ParseError, Presence, SessionStatus, UserId};
use std::collections::HashMap;

/// `presence` field: `none` | `in_queue` | `in_call`.
pub const FIELD_PRESENCE: &str = "presence";

/// `room_owner` field: owner id the participant is queued/called under.
/// Present iff presence is not `none`.
pub const FIELD_ROOM_OWNER: &str = "room_owner";

/// `call_id` field: opaque call token. Present iff presence is `in_call`.
pub const FIELD_CALL_ID: &str = "call_id";

/// `oh_status` field: mirrored session status, written on owner records
/// only.
pub const FIELD_OH_STATUS: &str = "oh_status";

/// `updated_at` field: last mutation timestamp, epoch milliseconds.
pub const FIELD_UPDATED_AT: &str = "updated_at";

/// Decoded participant record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRecord {
    /// Current presence. Missing field decodes as `None`.
    pub presence: Presence,
    /// Session the participant is queued/called under.
    pub owner: Option<UserId>,
    /// Opaque call token, set only while in a call.
    pub call_id: Option<String>,
    /// Mirrored session status (owner records only).
    pub session_status: Option<SessionStatus>,
    /// Last mutation timestamp, epoch milliseconds. Missing decodes as 0.
    pub updated_at: i64,
}

impl ParticipantRecord {
    /// Decode a record from its stored field map.
    ///
    /// An absent record (empty map) decodes to the lazy-creation default:
    /// presence `none`, no owner, no call.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if a stored field holds a token this version
    /// does not understand.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, ParseError> {
        let presence = match fields.get(FIELD_PRESENCE) {
            Some(raw) => raw.parse::<Presence>()?,
            None => Presence::None,
        };
        let owner = match fields.get(FIELD_ROOM_OWNER) {
            Some(raw) => Some(UserId::new(raw.clone())?),
            None => None,
        };
        let session_status = match fields.get(FIELD_OH_STATUS) {
            Some(raw) => Some(raw.parse::<SessionStatus>()?),
            None => None,
        };
        let updated_at = fields
            .get(FIELD_UPDATED_AT)
            .and_then(|raw| raw.parse::<i64>().ok())
            .unwrap_or(0);
        Ok(Self {
            presence,
            owner,
            call_id: fields.get(FIELD_CALL_ID).cloned(),
            session_status,
            updated_at,
        })
    }
}

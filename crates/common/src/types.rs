//! Common data types for Office Hours components.
//!
//! Identifiers are validated newtypes rather than raw strings: every id is
//! embedded into colon-delimited store keys, so a raw `:` or whitespace in an
//! id would corrupt the keyspace.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error produced when parsing an identifier or enum token fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Identifier is empty or contains a reserved character.
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// Unknown presence token.
    #[error("Invalid presence value: {0}")]
    InvalidPresence(String),

    /// Unknown session status token.
    #[error("Invalid session status: {0}")]
    InvalidStatus(String),
}

/// Unique identifier for a participant or session owner.
///
/// Owners are participants too: a session is keyed by its owner's id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and wrap a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidId` if the id is empty, contains
    /// whitespace, or contains `:` (the store key delimiter).
    pub fn new(raw: impl Into<String>) -> Result<Self, ParseError> {
        let raw = raw.into();
        if raw.is_empty() || raw.contains(':') || raw.chars().any(char::is_whitespace) {
            return Err(ParseError::InvalidId(raw));
        }
        Ok(Self(raw))
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// A participant's relationship to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// Not queued or in a call anywhere.
    None,
    /// Waiting in some owner's queue.
    InQueue,
    /// In some owner's call roster.
    InCall,
}

impl Presence {
    /// Store token for this presence value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Presence::None => "none",
            Presence::InQueue => "in_queue",
            Presence::InCall => "in_call",
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Presence {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Presence::None),
            "in_queue" => Ok(Presence::InQueue),
            "in_call" => Ok(Presence::InCall),
            other => Err(ParseError::InvalidPresence(other.to_string())),
        }
    }
}

/// Whether a session is currently accepting queue/call entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session is closed; queue/call entry attempts are rejected.
    Inactive,
    /// Session is open for queueing and calls.
    Active,
}

impl SessionStatus {
    /// Store token for this status value.
    ///
    /// `nonactive` matches the token the original deployment wrote, so a
    /// store populated by it reads back unchanged.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Inactive => "nonactive",
            SessionStatus::Active => "active",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "nonactive" => Ok(SessionStatus::Inactive),
            other => Err(ParseError::InvalidStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_accepts_plain_ids() {
        assert_eq!(UserId::new("101").unwrap().as_str(), "101");
        assert_eq!(UserId::new("alice-2").unwrap().as_str(), "alice-2");
    }

    #[test]
    fn test_user_id_rejects_reserved_characters() {
        assert!(matches!(UserId::new(""), Err(ParseError::InvalidId(_))));
        assert!(matches!(
            UserId::new("user:101"),
            Err(ParseError::InvalidId(_))
        ));
        assert!(matches!(
            UserId::new("user 101"),
            Err(ParseError::InvalidId(_))
        ));
        assert!(matches!(
            UserId::new("user\n101"),
            Err(ParseError::InvalidId(_))
        ));
    }

    #[test]
    fn test_presence_round_trip() {
        for presence in [Presence::None, Presence::InQueue, Presence::InCall] {
            assert_eq!(presence.as_str().parse::<Presence>().unwrap(), presence);
        }
        assert!(matches!(
            "dialing".parse::<Presence>(),
            Err(ParseError::InvalidPresence(_))
        ));
    }

    #[test]
    fn test_session_status_round_trip() {
        assert_eq!(
            "active".parse::<SessionStatus>().unwrap(),
            SessionStatus::Active
        );
        assert_eq!(
            "nonactive".parse::<SessionStatus>().unwrap(),
            SessionStatus::Inactive
        );
        assert!(matches!(
            "paused".parse::<SessionStatus>(),
            Err(ParseError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_user_id_serde_validates() {
        let id: UserId = serde_json::from_str("\"101\"").unwrap();
        assert_eq!(id.as_str(), "101");
        assert!(serde_json::from_str::<UserId>("\"bad:id\"").is_err());
    }
}

//! Office Hours coordinator error types.
//!
//! Internal details (store addresses, key names) are logged server-side but
//! not exposed through `client_message()`.

use common::types::ParseError;
use thiserror::Error;

use crate::store::StoreError;

/// Office Hours coordinator error type.
#[derive(Debug, Error)]
pub enum OhError {
    /// Actor lacks the capability for the attempted operation.
    /// Never retried automatically.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Queue/call entry attempted against an inactive session.
    /// Caller may retry after the session is activated.
    #[error("Session is not active: {0}")]
    SessionNotActive(String),

    /// Malformed identifier or invalid state token.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Underlying store operation failed. Propagated unmodified, no
    /// automatic retry.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl OhError {
    /// Returns a bounded label string for the error variant (for metrics).
    ///
    /// Uses variant names, not error message content, so label cardinality
    /// stays bounded.
    #[must_use]
    pub fn error_type_label(&self) -> &'static str {
        match self {
            OhError::Unauthorized(_) => "unauthorized",
            OhError::SessionNotActive(_) => "session_not_active",
            OhError::InvalidArgument(_) => "invalid_argument",
            OhError::Store(_) => "store",
        }
    }

    /// Returns a client-safe error message (no internal details).
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            OhError::Unauthorized(_) => "Not authorized".to_string(),
            OhError::SessionNotActive(_) => "Office hours are not active".to_string(),
            OhError::InvalidArgument(msg) => format!("Invalid argument: {msg}"),
            OhError::Store(_) => "An internal error occurred".to_string(),
        }
    }
}

impl From<ParseError> for OhError {
    fn from(err: ParseError) -> Self {
        OhError::InvalidArgument(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_type_labels_are_bounded() {
        assert_eq!(
            OhError::Unauthorized("x".to_string()).error_type_label(),
            "unauthorized"
        );
        assert_eq!(
            OhError::SessionNotActive("200".to_string()).error_type_label(),
            "session_not_active"
        );
        assert_eq!(
            OhError::InvalidArgument("bad id".to_string()).error_type_label(),
            "invalid_argument"
        );
        assert_eq!(
            OhError::Store(StoreError::Io("conn refused".to_string())).error_type_label(),
            "store"
        );
    }

    #[test]
    fn test_client_messages_hide_internal_details() {
        let store_err = OhError::Store(StoreError::Io(
            "connection refused at 192.168.1.100:6379".to_string(),
        ));
        assert!(!store_err.client_message().contains("192.168"));
        assert_eq!(store_err.client_message(), "An internal error occurred");

        let auth_err = OhError::Unauthorized("actor 7 changing presence of 9".to_string());
        assert_eq!(auth_err.client_message(), "Not authorized");
    }

    #[test]
    fn test_parse_error_maps_to_invalid_argument() {
        let parse_err = "dialing".parse::<common::types::Presence>().unwrap_err();
        let err: OhError = parse_err.into();
        assert!(matches!(err, OhError::InvalidArgument(_)));
        assert_eq!(err.error_type_label(), "invalid_argument");
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(
            format!("{}", OhError::SessionNotActive("200".to_string())),
            "Session is not active: 200"
        );
        assert_eq!(
            format!("{}", OhError::Unauthorized("cross-user".to_string())),
            "Unauthorized: cross-user"
        );
    }
}

//! Public Error Taxonomy
//!
//! [`McpError`] is the error type every public operation returns. Codec
//! and state-machine failures arrive wrapped from
//! [`crate::protocol::ProtocolError`]; delivery failures from
//! [`crate::transport::TransportError`], with the security- and
//! auth-scoped variants promoted to their own kinds so callers can match
//! on them directly.
//!
//! Scope policy: errors scoped to one operation are returned to that
//! caller only; errors scoped to the connection complete every pending
//! request and move the session to its `Error` state.

use std::time::Duration;

use thiserror::Error;

use crate::protocol::{JsonRpcError, ProtocolError};
use crate::transport::TransportError;

/// Result alias for public MCP operations
pub type McpResult<T> = Result<T, McpError>;

/// Errors surfaced by the public API
#[derive(Debug, Error)]
pub enum McpError {
    /// Codec or protocol-shape failure
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Transport delivery failure
    #[error(transparent)]
    Transport(TransportError),

    /// The server answered with a JSON-RPC error object
    #[error("Server error: {0}")]
    Server(JsonRpcError),

    /// Local validation of configuration or input failed
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Operation attempted in a session state that does not allow it
    #[error("Invalid session state: expected {expected}, session is {actual}")]
    InvalidState {
        expected: &'static str,
        actual: String,
    },

    /// Peer behaved in a way the protocol state machine forbids
    #[error("Protocol violation: {message}")]
    ProtocolViolation { message: String },

    /// The server settled on a protocol revision this runtime cannot speak
    #[error("Protocol version mismatch: requested {requested}, server offered {offered}")]
    VersionMismatch { requested: String, offered: String },

    /// The request deadline expired
    #[error("Request timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// The request was cancelled locally
    #[error("Request cancelled{}", reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    Cancelled { reason: Option<String> },

    /// The server rejected the request as unauthenticated or forbidden
    #[error("Authentication rejected: status {status}")]
    Auth { status: u16 },

    /// Session manager lookup miss
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// A URL violated the transport security policy
    #[error("Insecure scheme rejected: {url}")]
    InsecureScheme { url: String },

    /// A message exceeded a hard size limit
    #[error("Message too large: {size} bytes (max: {max_size} bytes)")]
    MessageTooLarge { size: usize, max_size: usize },

    /// Internal invariant failure
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl McpError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an invalid-state error
    pub fn invalid_state(expected: &'static str, actual: impl Into<String>) -> Self {
        Self::InvalidState {
            expected,
            actual: actual.into(),
        }
    }

    /// Create a protocol violation error
    pub fn protocol_violation(message: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            message: message.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(reason: Option<String>) -> Self {
        Self::Cancelled { reason }
    }

    /// Create a session-not-found error
    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        Self::SessionNotFound {
            session_id: session_id.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the server reported the method as unknown
    pub fn is_method_not_found(&self) -> bool {
        matches!(
            self,
            Self::Server(error)
                if error.code == crate::protocol::constants::error_codes::METHOD_NOT_FOUND
        )
    }

    /// Whether this error ends the whole connection rather than one
    /// operation
    pub fn is_connection_fatal(&self) -> bool {
        match self {
            Self::Transport(transport) => transport.is_fatal(),
            Self::VersionMismatch { .. } => true,
            _ => false,
        }
    }
}

impl From<TransportError> for McpError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Auth { status } => Self::Auth { status },
            TransportError::InsecureScheme { url } => Self::InsecureScheme { url },
            TransportError::MessageTooLarge { size, max_size } => {
                Self::MessageTooLarge { size, max_size }
            }
            TransportError::InvalidConfig { message } => Self::Validation { message },
            other => Self::Transport(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_auth_errors_are_promoted() {
        let err: McpError = TransportError::Auth { status: 401 }.into();
        assert!(matches!(err, McpError::Auth { status: 401 }));

        let err: McpError = TransportError::InsecureScheme {
            url: "http://x".to_string(),
        }
        .into();
        assert!(matches!(err, McpError::InsecureScheme { .. }));

        let err: McpError = TransportError::invalid_config("bad").into();
        assert!(matches!(err, McpError::Validation { .. }));
    }

    #[test]
    fn method_not_found_detection() {
        let err = McpError::Server(JsonRpcError::new(-32601, "Method not found", None));
        assert!(err.is_method_not_found());

        let err = McpError::Server(JsonRpcError::new(-32000, "other", None));
        assert!(!err.is_method_not_found());
    }

    #[test]
    fn connection_fatal_classification() {
        assert!(McpError::from(TransportError::Closed).is_connection_fatal());
        assert!(McpError::VersionMismatch {
            requested: "a".to_string(),
            offered: "b".to_string()
        }
        .is_connection_fatal());
        assert!(!McpError::Timeout {
            duration: Duration::from_secs(1)
        }
        .is_connection_fatal());
        assert!(!McpError::cancelled(None).is_connection_fatal());
    }

    #[test]
    fn cancelled_display_with_and_without_reason() {
        assert_eq!(McpError::cancelled(None).to_string(), "Request cancelled");
        assert_eq!(
            McpError::cancelled(Some("user aborted".to_string())).to_string(),
            "Request cancelled: user aborted"
        );
    }
}

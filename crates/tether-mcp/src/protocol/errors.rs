//! Protocol Error Types
//!
//! Errors raised by the JSON-RPC codec and the typed protocol layer.
//! Transport failures live in [`crate::transport::TransportError`]; the
//! public operation-level taxonomy lives in [`crate::error::McpError`].

use thiserror::Error;

/// Result alias for protocol-level operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors produced while encoding, decoding, or validating messages
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Bytes were not decodable as JSON at all
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// JSON decoded but does not match exactly one JSON-RPC 2.0 shape
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Message bytes were not valid UTF-8
    #[error("Encoding error: {message}")]
    Encoding { message: String },

    /// Serialization of an outbound message failed
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// Protocol version string is not in YYYY-MM-DD form
    #[error("Invalid protocol version: {0}")]
    InvalidProtocolVersion(String),

    /// The server settled on a version this runtime does not speak
    #[error("Protocol version mismatch: requested {requested}, server offered {offered}")]
    VersionMismatch { requested: String, offered: String },

    /// URI failed validation
    #[error("Invalid URI: {0}")]
    InvalidUri(String),
}

impl ProtocolError {
    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Create a version mismatch error
    pub fn version_mismatch(requested: impl Into<String>, offered: impl Into<String>) -> Self {
        Self::VersionMismatch {
            requested: requested.into(),
            offered: offered.into(),
        }
    }
}

//! Transport Error Types
//!
//! Common error types used by both transport implementations. Errors here
//! describe delivery failures; protocol-shape failures live in
//! [`crate::protocol::ProtocolError`].

use std::time::Duration;

use thiserror::Error;

/// Result alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Common transport error types
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport connection is closed
    #[error("Transport connection is closed")]
    Closed,

    /// Connection establishment failed (spawn, connect)
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// A single read or write exceeded its deadline
    #[error("{operation} timed out after {duration:?}")]
    IoTimeout {
        operation: &'static str,
        duration: Duration,
    },

    /// Message size exceeds the configured maximum
    #[error("Message too large: {size} bytes (max: {max_size} bytes)")]
    MessageTooLarge { size: usize, max_size: usize },

    /// HTTP request failed with a non-retriable status
    #[error("HTTP error: status {status}")]
    HttpStatus { status: u16 },

    /// HTTP request was rejected as unauthenticated or forbidden
    #[error("Authentication rejected: status {status}")]
    Auth { status: u16 },

    /// Retries were exhausted without a successful delivery
    #[error("Request failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// A URL violated the transport security policy
    #[error("Insecure scheme rejected: {url}")]
    InsecureScheme { url: String },

    /// Message framing or stream format error
    #[error("Message format error: {message}")]
    Format { message: String },

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport configuration failed validation
    #[error("Invalid transport configuration: {message}")]
    InvalidConfig { message: String },

    /// Transport-specific error
    #[error("Transport error: {details}")]
    Other { details: String },
}

impl TransportError {
    /// Create a connection error with a message
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create an I/O timeout error
    pub fn io_timeout(operation: &'static str, duration: Duration) -> Self {
        Self::IoTimeout {
            operation,
            duration,
        }
    }

    /// Create a message too large error
    pub fn message_too_large(size: usize, max_size: usize) -> Self {
        Self::MessageTooLarge { size, max_size }
    }

    /// Create a format error with a message
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a transport-specific error with details
    pub fn other(details: impl Into<String>) -> Self {
        Self::Other {
            details: details.into(),
        }
    }

    /// Whether the failure is scoped to the whole connection rather than
    /// a single operation
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Closed | Self::Connection { .. } | Self::RetriesExhausted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::message_too_large(11, 10);
        assert_eq!(err.to_string(), "Message too large: 11 bytes (max: 10 bytes)");

        let err = TransportError::io_timeout("read", Duration::from_secs(1));
        assert!(err.to_string().starts_with("read timed out"));

        let err = TransportError::Auth { status: 401 };
        assert_eq!(err.to_string(), "Authentication rejected: status 401");
    }

    #[test]
    fn test_transport_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let transport_err = TransportError::from(io_err);

        assert!(matches!(transport_err, TransportError::Io(_)));
        assert!(transport_err.to_string().contains("pipe broken"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(TransportError::Closed.is_fatal());
        assert!(TransportError::connection("gone").is_fatal());
        assert!(!TransportError::HttpStatus { status: 404 }.is_fatal());
        assert!(!TransportError::Auth { status: 403 }.is_fatal());
    }

    #[test]
    fn test_transport_error_traits() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TransportError>();
    }
}

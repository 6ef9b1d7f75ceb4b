//! Transport Layer
//!
//! Byte-level delivery for MCP messages over two wire formats: a spawned
//! child process speaking newline-delimited JSON (stdio), and streamable
//! HTTP with Server-Sent Events.
//!
//! Both implementations share one capability set - send encoded bytes,
//! surface inbound traffic as opaque [`TransportEvent`]s, close, report
//! connectivity and type - expressed as the [`Transport`] tagged union
//! rather than a trait object. Transports know nothing about sessions;
//! the session layer consumes the event channel.

// Layer 2: Third-party crate imports
use bytes::Bytes;
use tokio::sync::mpsc;

// Layer 3: Internal module imports
use crate::protocol::{JsonRpcMessage, ProtocolError};

pub mod error;
pub mod event_store;
pub mod http;
pub mod stdio;

pub use error::{TransportError, TransportResult};
pub use event_store::{EventStore, InMemoryEventStore};
pub use http::sse;
pub use http::{
    AuthConfig, Authenticator, EventStoreKind, HttpConfig, HttpStats, HttpTransport, TlsVersion,
    VersionPreference,
};
pub use stdio::{StdioConfig, StdioStats, StdioTransport};

/// An opaque event emitted by a transport
///
/// The transport owns no session pointer; everything it learns surfaces
/// here, on a channel the session subscribes to.
#[derive(Debug)]
pub enum TransportEvent {
    /// A decoded inbound message
    Message(JsonRpcMessage),
    /// An inbound payload that failed decoding (logged and dropped or
    /// answered with a parse error; the connection survives)
    Invalid(ProtocolError),
    /// A transport failure; fatal ones end the session
    Error(TransportError),
    /// The transport reached end of stream
    Closed,
}

/// The transport tagged union
///
/// Two variants implementing one capability set: `send`, `take_events`,
/// `close`, `is_connected`, `transport_type`, `session_id`.
#[derive(Debug)]
pub enum Transport {
    /// Child process over stdin/stdout
    Stdio(StdioTransport),
    /// Streamable HTTP with SSE
    Http(HttpTransport),
}

impl Transport {
    /// Spawn a child process transport
    pub async fn stdio(config: StdioConfig) -> TransportResult<Self> {
        Ok(Self::Stdio(StdioTransport::connect(config).await?))
    }

    /// Build a streamable HTTP transport
    pub fn http(
        config: HttpConfig,
        authenticator: Option<std::sync::Arc<dyn Authenticator>>,
    ) -> TransportResult<Self> {
        Ok(Self::Http(HttpTransport::connect(config, authenticator)?))
    }

    /// Queue one encoded message for delivery
    pub async fn send(&self, bytes: Bytes) -> TransportResult<()> {
        match self {
            Transport::Stdio(transport) => transport.send(bytes).await,
            Transport::Http(transport) => transport.send(bytes).await,
        }
    }

    /// Take the inbound event channel (once)
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<TransportEvent>> {
        match self {
            Transport::Stdio(transport) => transport.take_events(),
            Transport::Http(transport) => transport.take_events(),
        }
    }

    /// Close the transport; idempotent
    pub async fn close(&self) -> TransportResult<()> {
        match self {
            Transport::Stdio(transport) => transport.close().await,
            Transport::Http(transport) => transport.close().await,
        }
    }

    /// Start the SSE receive stream (HTTP only; a no-op for stdio)
    pub async fn start_sse(&self) {
        if let Transport::Http(transport) = self {
            transport.start_sse().await;
        }
    }

    /// Whether the transport is currently able to exchange messages
    pub fn is_connected(&self) -> bool {
        match self {
            Transport::Stdio(transport) => transport.is_connected(),
            Transport::Http(transport) => transport.is_connected(),
        }
    }

    /// Static transport type identifier for logging
    pub fn transport_type(&self) -> &'static str {
        match self {
            Transport::Stdio(_) => "stdio",
            Transport::Http(_) => "http",
        }
    }

    /// The transport-level session id, when one exists
    ///
    /// Stdio synthesizes one locally at spawn; HTTP learns it from the
    /// server during the handshake (or never, for servers that do not
    /// require session affinity).
    pub async fn session_id(&self) -> Option<String> {
        match self {
            Transport::Stdio(transport) => Some(transport.session_id().to_string()),
            Transport::Http(transport) => transport.session_id().await,
        }
    }

    /// Access the HTTP variant, when this is one
    pub fn as_http(&self) -> Option<&HttpTransport> {
        match self {
            Transport::Http(transport) => Some(transport),
            Transport::Stdio(_) => None,
        }
    }

    /// Access the HTTP variant mutably, when this is one
    pub fn as_http_mut(&mut self) -> Option<&mut HttpTransport> {
        match self {
            Transport::Http(transport) => Some(transport),
            Transport::Stdio(_) => None,
        }
    }

    /// Access the stdio variant, when this is one
    pub fn as_stdio(&self) -> Option<&StdioTransport> {
        match self {
            Transport::Stdio(transport) => Some(transport),
            Transport::Http(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tagged_union_dispatches_to_stdio() {
        let mut transport = Transport::stdio(StdioConfig::new(["cat"])).await.unwrap();
        assert_eq!(transport.transport_type(), "stdio");
        assert!(transport.is_connected());
        assert!(transport.session_id().await.unwrap().starts_with("stdio-"));
        assert!(transport.as_http().is_none());
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn tagged_union_dispatches_to_http() {
        let config = HttpConfig::new("https://example.invalid/mcp").unwrap();
        let mut transport = Transport::http(config, None).unwrap();
        assert_eq!(transport.transport_type(), "http");
        assert!(transport.session_id().await.is_none());
        assert!(transport.as_stdio().is_none());
        transport.close().await.unwrap();
    }
}

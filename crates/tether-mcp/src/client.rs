//! High-level MCP Client
//!
//! The minimal public facade over the session manager: connect a session
//! over either transport, run the handshake, and hand back the typed
//! [`Session`] while tracking it in the registry.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use tracing::debug;

// Layer 3: Internal module imports
use crate::error::McpResult;
use crate::protocol::{ClientCapabilities, ClientInfo};
use crate::session::{CloseReport, ManagerStats, Session, SessionConfig, SessionManager};
use crate::transport::{
    Authenticator, HttpConfig, StdioConfig, Transport, VersionPreference,
};

/// Builder for [`McpClient`]
///
/// # Examples
///
/// ```rust
/// use tether_mcp::client::McpClientBuilder;
/// use std::time::Duration;
///
/// let client = McpClientBuilder::new()
///     .client_info("my-host", "0.3.1")
///     .response_timeout(Duration::from_secs(10))
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct McpClientBuilder {
    config: SessionConfig,
}

impl McpClientBuilder {
    /// Start from the default session configuration
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    /// Set the client identity sent during initialization
    pub fn client_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.config.client_info = ClientInfo {
            name: name.into(),
            version: version.into(),
        };
        self
    }

    /// Set the advertised client capabilities
    pub fn capabilities(mut self, capabilities: ClientCapabilities) -> Self {
        self.config.capabilities = capabilities;
        self
    }

    /// Set the protocol revision preference
    pub fn protocol_version(mut self, preference: VersionPreference) -> Self {
        self.config.protocol_version = preference;
        self
    }

    /// Set the per-request response deadline
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.config.response_timeout = timeout;
        self
    }

    /// Build the client
    pub fn build(self) -> McpClient {
        McpClient {
            config: self.config,
            manager: SessionManager::new(),
        }
    }
}

/// Multi-session MCP client
///
/// Owns a [`SessionManager`]; every connected session is registered under
/// its id until closed.
#[derive(Debug)]
pub struct McpClient {
    config: SessionConfig,
    manager: SessionManager,
}

impl McpClient {
    /// Create a client with default configuration
    pub fn new() -> Self {
        McpClientBuilder::new().build()
    }

    /// Connect and initialize a session over a spawned child process
    pub async fn connect_stdio(&self, config: StdioConfig) -> McpResult<Session> {
        let transport = Transport::stdio(config).await?;
        self.establish(transport).await
    }

    /// Connect and initialize a session over streamable HTTP
    pub async fn connect_http(&self, config: HttpConfig) -> McpResult<Session> {
        let transport = Transport::http(config, None)?;
        self.establish(transport).await
    }

    /// Connect over HTTP with an [`Authenticator`] hook for credentials
    pub async fn connect_http_with_authenticator(
        &self,
        config: HttpConfig,
        authenticator: Arc<dyn Authenticator>,
    ) -> McpResult<Session> {
        let transport = Transport::http(config, Some(authenticator))?;
        self.establish(transport).await
    }

    async fn establish(&self, transport: Transport) -> McpResult<Session> {
        let session = Session::connect(transport, self.config.clone())?;

        if let Err(e) = session.initialize().await {
            // The handshake failed; make sure the transport is gone.
            let _ = session.close().await;
            return Err(e);
        }

        self.manager.add(session.clone())?;
        debug!(session_id = %session.id(), "session established");
        Ok(session)
    }

    /// Look up an established session by id
    pub fn session(&self, session_id: &str) -> McpResult<Session> {
        self.manager.get(session_id)
    }

    /// Whether a session id is registered
    pub fn has_session(&self, session_id: &str) -> bool {
        self.manager.has(session_id)
    }

    /// Close one session and drop it from the registry
    pub async fn close_session(&self, session_id: &str) -> McpResult<()> {
        let session = self.manager.remove(session_id)?;
        session.close().await
    }

    /// Close every session, best effort
    pub async fn close_all(&self) -> CloseReport {
        self.manager.close_all().await
    }

    /// Aggregated statistics over the registered sessions
    pub async fn stats(&self) -> ManagerStats {
        self.manager.stats().await
    }
}

impl Default for McpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::McpError;

    const INIT_RESPONSE: &str = r#"{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2025-03-26","serverInfo":{"name":"scripted","version":"1"},"capabilities":{}}}"#;

    #[tokio::test]
    async fn connect_stdio_registers_the_session() {
        let script = format!(r#"read a; printf '%s\n' '{INIT_RESPONSE}'; read b; sleep 2"#);
        let client = McpClientBuilder::new()
            .client_info("test-host", "0.0.0")
            .build();

        let session = client
            .connect_stdio(StdioConfig::new(["sh", "-c", &script]))
            .await
            .unwrap();

        assert!(client.has_session(session.id()));
        assert_eq!(client.stats().await.sessions, 1);

        client.close_session(session.id()).await.unwrap();
        assert!(!client.has_session(session.id()));
    }

    #[tokio::test]
    async fn failed_handshake_leaves_no_session_behind() {
        // The child exits immediately: initialize cannot complete.
        let client = McpClient::new();
        let result = client
            .connect_stdio(StdioConfig::new(["sh", "-c", "exit 0"]))
            .await;

        assert!(result.is_err());
        assert_eq!(client.stats().await.sessions, 0);
    }

    #[tokio::test]
    async fn close_session_on_unknown_id_errors() {
        let client = McpClient::new();
        let err = client.close_session("ghost").await.unwrap_err();
        assert!(matches!(err, McpError::SessionNotFound { .. }));
    }
}

//! Initialization Handshake Messages
//!
//! The `initialize` request/response pair and the `notifications/initialized`
//! notification that together bring a session from `New` to `Ready`.

use serde::{Deserialize, Serialize};

use crate::protocol::capabilities::{ClientCapabilities, ServerCapabilities};
use crate::protocol::types::{ClientInfo, ProtocolVersion, ServerInfo};

/// Parameters of the `initialize` request
///
/// First message in the protocol lifecycle. The client advertises its
/// preferred protocol revision and capability set.
///
/// # Examples
///
/// ```rust
/// use tether_mcp::protocol::{ClientCapabilities, ClientInfo, InitializeRequest};
///
/// let request = InitializeRequest::new(
///     ClientCapabilities::minimal(),
///     ClientInfo {
///         name: "example-client".to_string(),
///         version: "1.0.0".to_string(),
///     },
/// );
/// assert_eq!(request.protocol_version.as_str(), "2025-03-26");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitializeRequest {
    /// Protocol version being requested
    #[serde(rename = "protocolVersion")]
    pub protocol_version: ProtocolVersion,

    /// Client capabilities
    pub capabilities: ClientCapabilities,

    /// Client information
    #[serde(rename = "clientInfo")]
    pub client_info: ClientInfo,
}

impl InitializeRequest {
    /// Create an initialize request for the preferred protocol version
    pub fn new(capabilities: ClientCapabilities, client_info: ClientInfo) -> Self {
        Self::with_version(ProtocolVersion::current(), capabilities, client_info)
    }

    /// Create an initialize request for a specific protocol version
    ///
    /// Used by the automatic fallback path, which retries with the legacy
    /// revision when the preferred one is rejected.
    pub fn with_version(
        protocol_version: ProtocolVersion,
        capabilities: ClientCapabilities,
        client_info: ClientInfo,
    ) -> Self {
        Self {
            protocol_version,
            capabilities,
            client_info,
        }
    }
}

/// Result payload of the `initialize` response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitializeResponse {
    /// Protocol version the server settled on
    #[serde(rename = "protocolVersion")]
    pub protocol_version: ProtocolVersion,

    /// Server capabilities
    pub capabilities: ServerCapabilities,

    /// Server information
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,

    /// Optional instructions for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn initialize_request_wire_format() {
        let request = InitializeRequest::new(
            ClientCapabilities::minimal(),
            ClientInfo {
                name: "t".to_string(),
                version: "1".to_string(),
            },
        );

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": {"name": "t", "version": "1"}
            })
        );
    }

    #[test]
    fn initialize_response_parses_spec_shape() {
        let response: InitializeResponse = serde_json::from_value(json!({
            "protocolVersion": "2025-03-26",
            "serverInfo": {"name": "s", "version": "1"},
            "capabilities": {"tools": {"listChanged": false}}
        }))
        .unwrap();

        assert_eq!(response.server_info.name, "s");
        assert!(response.capabilities.has_tools());
        assert!(response.instructions.is_none());
    }

    #[test]
    fn with_version_selects_legacy_revision() {
        let request = InitializeRequest::with_version(
            ProtocolVersion::legacy(),
            ClientCapabilities::minimal(),
            ClientInfo {
                name: "t".to_string(),
                version: "1".to_string(),
            },
        );
        assert_eq!(request.protocol_version.as_str(), "2024-11-05");
    }
}

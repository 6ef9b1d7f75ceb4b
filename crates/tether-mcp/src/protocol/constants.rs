//! MCP Protocol Constants
//!
//! This module defines constants for MCP protocol method names, JSON-RPC
//! error codes, wire headers, and other standardized values to ensure
//! consistency and reduce typos.

/// MCP protocol method names
pub mod methods {
    /// Initialization method
    pub const INITIALIZE: &str = "initialize";
    /// Initialized notification (sent by the client after the handshake)
    pub const NOTIFICATION_INITIALIZED: &str = "notifications/initialized";

    /// Connectivity testing method
    pub const PING: &str = "ping";

    /// Tool-related methods
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";

    /// Resource-related methods
    pub const RESOURCES_LIST: &str = "resources/list";
    pub const RESOURCES_TEMPLATES_LIST: &str = "resources/templates/list";
    pub const RESOURCES_READ: &str = "resources/read";
    pub const RESOURCES_SUBSCRIBE: &str = "resources/subscribe";
    pub const RESOURCES_UNSUBSCRIBE: &str = "resources/unsubscribe";

    /// Prompt-related methods
    pub const PROMPTS_LIST: &str = "prompts/list";
    pub const PROMPTS_GET: &str = "prompts/get";

    /// Server-initiated requests
    pub const SAMPLING_CREATE_MESSAGE: &str = "sampling/createMessage";
    pub const ROOTS_LIST: &str = "roots/list";

    /// Notification methods (either direction)
    pub const NOTIFICATION_CANCELLED: &str = "notifications/cancelled";
    pub const NOTIFICATION_PROGRESS: &str = "notifications/progress";
    pub const NOTIFICATION_MESSAGE: &str = "notifications/message";
    pub const NOTIFICATION_RESOURCES_UPDATED: &str = "notifications/resources/updated";
    pub const NOTIFICATION_RESOURCES_LIST_CHANGED: &str = "notifications/resources/list_changed";
    pub const NOTIFICATION_TOOLS_LIST_CHANGED: &str = "notifications/tools/list_changed";
    pub const NOTIFICATION_PROMPTS_LIST_CHANGED: &str = "notifications/prompts/list_changed";
}

/// JSON-RPC error codes
pub mod error_codes {
    /// Parse error - Invalid JSON was received by the server
    pub const PARSE_ERROR: i32 = -32700;

    /// Invalid Request - The JSON sent is not a valid Request object
    pub const INVALID_REQUEST: i32 = -32600;

    /// Method not found - The method does not exist / is not available
    pub const METHOD_NOT_FOUND: i32 = -32601;

    /// Invalid params - Invalid method parameter(s)
    pub const INVALID_PARAMS: i32 = -32602;

    /// Internal error - Internal JSON-RPC error
    pub const INTERNAL_ERROR: i32 = -32603;

    /// Server error - Application-specific error
    pub const SERVER_ERROR: i32 = -32000;
}

/// HTTP header names used by the streamable HTTP transport
pub mod headers {
    /// Session affinity header assigned by the server on initialize
    pub const MCP_SESSION_ID: &str = "Mcp-Session-Id";

    /// SSE resumption header carrying the last seen event id
    pub const LAST_EVENT_ID: &str = "Last-Event-ID";
}

/// Protocol versions this runtime knows how to speak
pub mod versions {
    /// Streamable HTTP revision (preferred)
    pub const V2025_03_26: &str = "2025-03-26";

    /// Legacy HTTP+SSE revision (fallback)
    pub const V2024_11_05: &str = "2024-11-05";

    /// All revisions the runtime accepts from a server, newest first
    pub const SUPPORTED: &[&str] = &[V2025_03_26, V2024_11_05];
}

/// Default values shared across transports and sessions
pub mod defaults {
    use std::time::Duration;

    /// Default client name
    pub const CLIENT_NAME: &str = "tether-mcp-client";

    /// Default response timeout for a single request
    pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

    /// Default maximum retry attempts for HTTP sends
    pub const MAX_RETRIES: u32 = 3;

    /// Default initial retry delay for HTTP sends
    pub const RETRY_DELAY: Duration = Duration::from_secs(1);

    /// Default line buffer cap for the stdio transport
    pub const BUFFER_SIZE: usize = 1024 * 1024;

    /// Default grace period for child process shutdown
    pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

    /// Default user agent for HTTP requests
    pub const USER_AGENT: &str = concat!("tether-mcp/", env!("CARGO_PKG_VERSION"));

    /// Minimum interval between outbound POSTs (backpressure)
    pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(10);

    /// Bound on the server-initiated notification queue
    pub const NOTIFICATION_QUEUE_CAPACITY: usize = 256;

    /// Hard cap on an outbound request body
    pub const MAX_REQUEST_SIZE: usize = 10 * 1024 * 1024;

    /// Hard cap on an HTTP response body
    pub const MAX_RESPONSE_SIZE: usize = 50 * 1024 * 1024;

    /// Bounded in-memory tail kept for captured child stderr
    pub const STDERR_TAIL_BYTES: usize = 64 * 1024;

    /// Default event replay store capacity
    pub const EVENT_STORE_MAX_EVENTS: usize = 1024;

    /// Default event replay store entry lifetime
    pub const EVENT_STORE_EXPIRATION: Duration = Duration::from_secs(300);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_versions_are_newest_first() {
        assert_eq!(versions::SUPPORTED[0], versions::V2025_03_26);
        assert!(versions::SUPPORTED.contains(&versions::V2024_11_05));
    }

    #[test]
    fn error_codes_match_jsonrpc_spec() {
        assert_eq!(error_codes::PARSE_ERROR, -32700);
        assert_eq!(error_codes::INVALID_REQUEST, -32600);
        assert_eq!(error_codes::METHOD_NOT_FOUND, -32601);
        assert_eq!(error_codes::INVALID_PARAMS, -32602);
        assert_eq!(error_codes::INTERNAL_ERROR, -32603);
    }
}

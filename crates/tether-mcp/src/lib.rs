//! Tether MCP - Model Context Protocol Runtime
//!
//! This crate provides a Model Context Protocol (MCP) client/server
//! runtime built on a JSON-RPC 2.0 foundation: pluggable transports
//! (child-process stdio and streamable HTTP with Server-Sent Events),
//! session lifecycle with capability negotiation, request correlation,
//! cancellation, and SSE resumption with event replay.
//!
//! # Architecture
//!
//! The implementation is organized in layers, leaves first:
//!
//! - **Protocol Layer** (`protocol`): JSON-RPC 2.0 message types, a strict
//!   wire codec, and the typed MCP message vocabulary
//! - **Transport Layer** (`transport`): the stdio and HTTP/SSE byte-level
//!   channels behind one capability set, plus the event replay store
//! - **Session Layer** (`session`): the protocol state machine - handshake,
//!   correlation, cancellation, notifications - and the session registry
//! - **Registry Layer** (`registry`): host-facing tool/prompt/resource
//!   registries with validation and dispatch
//! - **Client Facade** (`client`): the minimal public connect-and-call API
//!
//! # Protocol Support
//!
//! Speaks MCP `2025-03-26` (streamable HTTP) by default and falls back to
//! the `2024-11-05` HTTP+SSE flow automatically when the server rejects
//! the current revision at the protocol level.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tether_mcp::client::McpClientBuilder;
//! use tether_mcp::transport::StdioConfig;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = McpClientBuilder::new()
//!     .client_info("my-host", env!("CARGO_PKG_VERSION"))
//!     .build();
//!
//! let session = client
//!     .connect_stdio(StdioConfig::new(["my-mcp-server", "--stdio"]))
//!     .await?;
//!
//! let tools = session.list_tools(None).await?;
//! for tool in &tools.tools {
//!     println!("tool: {}", tool.name);
//! }
//!
//! let result = session.call_tool("echo", Some(json!({"text": "hi"}))).await?;
//! println!("{result:?}");
//!
//! client.close_all().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency Model
//!
//! One reader task per transport decodes inbound messages; any number of
//! caller tasks may issue requests concurrently against a session, with
//! correlation purely by request id. Outbound writes go through a
//! single-writer discipline so framing is never interleaved, and
//! server-initiated notifications are decoupled from the read path
//! through a bounded queue.

pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod transport;

// Crate-level re-exports for the most common types
pub use client::{McpClient, McpClientBuilder};
pub use error::{McpError, McpResult};
pub use protocol::{
    JsonRpcMessage, JsonRpcMessageExt, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    RequestId,
};
pub use session::{Session, SessionConfig, SessionManager, SessionState};
pub use transport::{HttpConfig, StdioConfig, Transport, TransportError};

//! MCP Protocol Layer
//!
//! JSON-RPC 2.0 message types and strict wire codec, plus the typed MCP
//! message vocabulary: handshake, capabilities, content blocks, and the
//! per-method parameter/result types.
//!
//! This layer is pure data: it never touches a socket or a pipe. The
//! transports in [`crate::transport`] move the bytes; the sessions in
//! [`crate::session`] drive the state machine.

pub mod capabilities;
pub mod codec;
pub mod constants;
pub mod content;
pub mod errors;
pub mod message;
pub mod messages;
pub mod types;

pub use capabilities::{
    ClientCapabilities, PromptCapabilities, ResourceCapabilities, SamplingCapabilities,
    ServerCapabilities, ToolCapabilities,
};
pub use content::{Content, EmbeddedResource};
pub use errors::{ProtocolError, ProtocolResult};
pub use message::{
    JsonRpcError, JsonRpcMessage, JsonRpcMessageExt, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId,
};
pub use messages::*;
pub use types::{ClientInfo, ProtocolVersion, ServerInfo, Uri};

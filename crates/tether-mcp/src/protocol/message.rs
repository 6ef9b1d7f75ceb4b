//! Core JSON-RPC 2.0 message types with shared serialization behavior
//!
//! This module implements the fundamental message structures defined by the
//! JSON-RPC 2.0 specification. Strict wire-level validation (shape checking,
//! UTF-8 enforcement) lives in [`super::codec`]; the types here are the
//! in-memory representation shared by every transport.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Trait for JSON-RPC message serialization and deserialization
///
/// Provides common functionality for all JSON-RPC message types so each
/// transport serializes messages the same way. Any type that implements
/// `Serialize + Deserialize` gets the default implementations for free.
///
/// # Examples
///
/// ```rust
/// use tether_mcp::protocol::{JsonRpcMessageExt, JsonRpcRequest, RequestId};
///
/// let request = JsonRpcRequest::new("ping", None, RequestId::new_number(1));
/// let json = request.to_json().unwrap();
/// let parsed = JsonRpcRequest::from_json(&json).unwrap();
///
/// assert_eq!(request, parsed);
/// ```
pub trait JsonRpcMessageExt: Serialize + for<'de> Deserialize<'de> + Sized {
    /// Serialize this message to a compact JSON string
    ///
    /// Compact output is mandatory for the stdio transport, where a message
    /// must not contain raw line breaks.
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a message from a JSON string
    fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize directly into a reusable buffer, returning bytes written
    fn serialize_to_buffer(&self, buffer: &mut BytesMut) -> Result<usize, serde_json::Error> {
        let start_len = buffer.len();
        let writer = buffer.writer();
        serde_json::to_writer(writer, self)?;
        Ok(buffer.len() - start_len)
    }

    /// Serialize to bytes without an intermediate `String` allocation
    fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        let mut buffer = BytesMut::with_capacity(256);
        self.serialize_to_buffer(&mut buffer)?;
        Ok(buffer.freeze())
    }

    /// Deserialize a message from JSON bytes
    fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Request ID supporting both string and numeric formats per JSON-RPC 2.0
///
/// Ids are preserved exactly as received: a numeric `1` never becomes `"1"`
/// and vice versa. Null ids are represented by `Option<RequestId>` on the
/// response type, never by a variant here.
///
/// # Examples
///
/// ```rust
/// use tether_mcp::protocol::RequestId;
///
/// let string_id = RequestId::new_string("req-123");
/// let numeric_id = RequestId::new_number(42);
///
/// assert_eq!(serde_json::to_string(&string_id).unwrap(), r#""req-123""#);
/// assert_eq!(serde_json::to_string(&numeric_id).unwrap(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String-based request identifier
    String(String),
    /// Numeric request identifier
    Number(i64),
}

impl RequestId {
    /// Create a new string-based request ID
    pub fn new_string(id: impl Into<String>) -> Self {
        RequestId::String(id.into())
    }

    /// Create a new numeric request ID
    pub fn new_number(id: i64) -> Self {
        RequestId::Number(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Number(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        RequestId::String(id.to_string())
    }
}

/// JSON-RPC 2.0 Request Message
///
/// # JSON-RPC 2.0 Specification Compliance
///
/// - `jsonrpc`: MUST be exactly "2.0"
/// - `method`: MUST be a String containing the name of the method to invoke
/// - `params`: MAY be omitted. If present, MUST be an Object or an Array
/// - `id`: MUST be a String or a Number, unique per open request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    /// Protocol version - always "2.0"
    pub jsonrpc: String,

    /// Name of the method to invoke
    pub method: String,

    /// Parameters for the method (object or array; omitted when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    /// Unique identifier for this request
    pub id: RequestId,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC 2.0 request
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tether_mcp::protocol::{JsonRpcRequest, RequestId};
    /// use serde_json::json;
    ///
    /// let request = JsonRpcRequest::new(
    ///     "tools/call",
    ///     Some(json!({"name": "echo", "arguments": {}})),
    ///     RequestId::new_number(7),
    /// );
    /// ```
    pub fn new(method: impl Into<String>, params: Option<Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

impl JsonRpcMessageExt for JsonRpcRequest {}

/// JSON-RPC 2.0 error object carried inside an error response
///
/// `code` and `message` are required; `data` is free-form extra detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    /// Numeric error code (see [`super::constants::error_codes`])
    pub code: i32,

    /// Human-readable error summary
    pub message: String,

    /// Optional structured error detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create a new error object
    pub fn new(code: i32, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// JSON-RPC 2.0 Response Message
///
/// Contains either a successful result or error information, never both.
/// The `id` mirrors the originating request; it is `None` only on error
/// responses for messages whose id could not be recovered (parse errors).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    /// Protocol version - always "2.0"
    pub jsonrpc: String,

    /// Result of successful method invocation (mutually exclusive with error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error information for failed method invocation (mutually exclusive with result)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,

    /// Request identifier from the original request (null for parse errors)
    pub id: Option<RequestId>,
}

impl JsonRpcResponse {
    /// Create a successful JSON-RPC 2.0 response
    pub fn success(result: Value, id: RequestId) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id: Some(id),
        }
    }

    /// Create an error JSON-RPC 2.0 response
    ///
    /// `id` is `None` only when replying to an unidentifiable inbound
    /// message (a parse error).
    pub fn error(error: JsonRpcError, id: Option<RequestId>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Whether this response carries an error payload
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl JsonRpcMessageExt for JsonRpcResponse {}

/// JSON-RPC 2.0 Notification Message
///
/// A request without an `id`: fire and forget, no response expected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcNotification {
    /// Protocol version - always "2.0"
    pub jsonrpc: String,

    /// Name of the notification method
    pub method: String,

    /// Parameters for the notification (object or array; omitted when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    // No `id` field - that is what makes it a notification
}

impl JsonRpcNotification {
    /// Create a new JSON-RPC 2.0 notification
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
        }
    }
}

impl JsonRpcMessageExt for JsonRpcNotification {}

/// Any JSON-RPC 2.0 message, as a tagged-by-shape union
///
/// Strict decoding goes through [`super::codec::decode`], which enforces
/// the one-of-four-shapes invariant and produces precise errors. The
/// serde order below matters for the untagged fallback: a notification
/// must be tried before a response, whose fields are all optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// A request expecting a correlated response
    Request(JsonRpcRequest),
    /// A one-way notification
    Notification(JsonRpcNotification),
    /// A response (success or error) to a prior request
    Response(JsonRpcResponse),
}

impl JsonRpcMessage {
    /// The method name, for requests and notifications
    pub fn method(&self) -> Option<&str> {
        match self {
            JsonRpcMessage::Request(r) => Some(&r.method),
            JsonRpcMessage::Notification(n) => Some(&n.method),
            JsonRpcMessage::Response(_) => None,
        }
    }

    /// The request id, for requests and identified responses
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            JsonRpcMessage::Request(r) => Some(&r.id),
            JsonRpcMessage::Response(r) => r.id.as_ref(),
            JsonRpcMessage::Notification(_) => None,
        }
    }

    /// Whether this message is a notification
    pub fn is_notification(&self) -> bool {
        matches!(self, JsonRpcMessage::Notification(_))
    }
}

impl JsonRpcMessageExt for JsonRpcMessage {}

impl From<JsonRpcRequest> for JsonRpcMessage {
    fn from(request: JsonRpcRequest) -> Self {
        JsonRpcMessage::Request(request)
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(response: JsonRpcResponse) -> Self {
        JsonRpcMessage::Response(response)
    }
}

impl From<JsonRpcNotification> for JsonRpcMessage {
    fn from(notification: JsonRpcNotification) -> Self {
        JsonRpcMessage::Notification(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_id_serialization_preserves_format() {
        let string_id = RequestId::String("test-123".to_string());
        let numeric_id = RequestId::Number(42);

        assert_eq!(serde_json::to_string(&string_id).unwrap(), r#""test-123""#);
        assert_eq!(serde_json::to_string(&numeric_id).unwrap(), "42");

        let parsed: RequestId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, RequestId::Number(42));
        let parsed: RequestId = serde_json::from_str(r#""42""#).unwrap();
        assert_eq!(parsed, RequestId::String("42".to_string()));
    }

    #[test]
    fn test_request_creation_and_serialization() {
        let request =
            JsonRpcRequest::new("subtract", Some(json!([42, 23])), RequestId::new_number(1));

        assert_eq!(request.jsonrpc, "2.0");
        let json = request.to_json().unwrap();

        assert!(json.contains(r#""jsonrpc":"2.0""#));
        assert!(json.contains(r#""method":"subtract""#));
        assert!(json.contains(r#""params":[42,23]"#));
        assert!(json.contains(r#""id":1"#));
    }

    #[test]
    fn test_request_without_params_omits_field() {
        let request = JsonRpcRequest::new("ping", None, RequestId::new_string("ping-001"));
        let json = request.to_json().unwrap();

        assert!(!json.contains("params"));
        assert!(json.contains(r#""id":"ping-001""#));
    }

    #[test]
    fn test_success_response_serialization() {
        let response = JsonRpcResponse::success(json!({"tools": []}), RequestId::new_number(7));

        let json = response.to_json().unwrap();
        assert!(json.contains(r#""result":{"tools":[]}"#));
        assert!(!json.contains("error"));
        assert!(json.contains(r#""id":7"#));
    }

    #[test]
    fn test_error_response_serialization() {
        let response = JsonRpcResponse::error(
            JsonRpcError::new(-32601, "Method not found", None),
            Some(RequestId::new_string("req-456")),
        );

        let json = response.to_json().unwrap();
        assert!(json.contains(r#""error":{"code":-32601,"message":"Method not found"}"#));
        assert!(!json.contains("result"));
        assert!(json.contains(r#""id":"req-456""#));
    }

    #[test]
    fn test_parse_error_response_has_null_id() {
        let response =
            JsonRpcResponse::error(JsonRpcError::new(-32700, "Parse error", None), None);
        let json = response.to_json().unwrap();
        assert!(json.contains(r#""id":null"#));
    }

    #[test]
    fn test_notification_has_no_id() {
        let notification =
            JsonRpcNotification::new("notifications/initialized", Some(json!({})));
        let json = notification.to_json().unwrap();

        assert!(
            !json.contains("\"id\""),
            "notification must not contain an id field, got: {json}"
        );
    }

    #[test]
    fn test_message_accessors() {
        let request: JsonRpcMessage =
            JsonRpcRequest::new("ping", None, RequestId::new_number(3)).into();
        assert_eq!(request.method(), Some("ping"));
        assert_eq!(request.id(), Some(&RequestId::Number(3)));
        assert!(!request.is_notification());

        let notification: JsonRpcMessage =
            JsonRpcNotification::new("notifications/progress", None).into();
        assert_eq!(notification.method(), Some("notifications/progress"));
        assert!(notification.id().is_none());
        assert!(notification.is_notification());
    }

    #[test]
    fn test_round_trip_serialization() {
        let original = JsonRpcRequest::new(
            "resources/read",
            Some(json!({"uri": "file:///tmp/a"})),
            RequestId::new_string("read-1"),
        );

        let json = original.to_json().unwrap();
        let parsed = JsonRpcRequest::from_json(&json).unwrap();
        assert_eq!(original, parsed);

        let bytes = original.to_bytes().unwrap();
        let parsed = JsonRpcRequest::from_bytes(&bytes).unwrap();
        assert_eq!(original, parsed);
    }
}

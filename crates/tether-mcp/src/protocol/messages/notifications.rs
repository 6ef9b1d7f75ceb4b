//! Notification Parameter Types
//!
//! Typed parameter payloads for the notification methods the runtime
//! produces or routes: cancellation, progress, logging messages, and the
//! resource-updated family.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::message::RequestId;
use crate::protocol::types::Uri;

/// Parameters of `notifications/cancelled`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancelledParams {
    /// Id of the request being abandoned
    #[serde(rename = "requestId")]
    pub request_id: RequestId,

    /// Optional human-readable reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CancelledParams {
    /// Create cancellation parameters
    pub fn new(request_id: RequestId, reason: Option<String>) -> Self {
        Self { request_id, reason }
    }
}

/// Parameters of `notifications/progress`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressParams {
    /// Token correlating progress with the originating request
    #[serde(rename = "progressToken")]
    pub progress_token: Value,

    /// Work completed so far
    pub progress: f64,

    /// Total work expected, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
}

/// Parameters of `notifications/message` (server log forwarding)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingMessageParams {
    /// Severity level (e.g. "debug", "info", "warning", "error")
    pub level: String,

    /// Optional logger name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,

    /// Structured log payload
    pub data: Value,
}

/// Parameters of `notifications/resources/updated`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceUpdatedParams {
    /// URI of the resource that changed
    pub uri: Uri,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cancelled_params_wire_format() {
        let params = CancelledParams::new(RequestId::new_number(9), None);
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"requestId": 9})
        );

        let params = CancelledParams::new(
            RequestId::new_string("r-1"),
            Some("user aborted".to_string()),
        );
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"requestId": "r-1", "reason": "user aborted"})
        );
    }

    #[test]
    fn progress_params_parse() {
        let params: ProgressParams = serde_json::from_value(json!({
            "progressToken": "op-1",
            "progress": 3.0,
            "total": 10.0
        }))
        .unwrap();
        assert_eq!(params.progress, 3.0);
        assert_eq!(params.total, Some(10.0));
    }

    #[test]
    fn logging_message_parse() {
        let params: LoggingMessageParams = serde_json::from_value(json!({
            "level": "warning",
            "data": {"msg": "disk almost full"}
        }))
        .unwrap();
        assert_eq!(params.level, "warning");
        assert!(params.logger.is_none());
    }
}

//! Tool Messages
//!
//! Types for `tools/list` and `tools/call`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::content::Content;

/// A tool advertised by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// Unique tool name within the server
    pub name: String,

    /// Optional description of what the tool does
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema describing the tool's arguments
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl Tool {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            input_schema,
        }
    }

    /// Names of arguments marked required by the input schema
    pub fn required_arguments(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|required| required.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Parameters of `tools/list`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListToolsRequest {
    /// Pagination cursor from a previous response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl ListToolsRequest {
    /// Request the first page
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a subsequent page
    pub fn with_cursor(cursor: impl Into<String>) -> Self {
        Self {
            cursor: Some(cursor.into()),
        }
    }
}

/// Result payload of `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListToolsResponse {
    /// The advertised tools
    pub tools: Vec<Tool>,

    /// Cursor for the next page, when more tools exist
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Parameters of `tools/call`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallToolRequest {
    /// Name of the tool to invoke
    pub name: String,

    /// Tool arguments matching the input schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

impl CallToolRequest {
    /// Create a tool call
    pub fn new(name: impl Into<String>, arguments: Option<Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Result payload of `tools/call`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallToolResponse {
    /// Content blocks produced by the tool
    pub content: Vec<Content>,

    /// Whether the tool itself reported failure
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_wire_format_uses_input_schema_camel_case() {
        let tool = Tool::new("echo", Some("Echo input".to_string()), json!({"type": "object"}));
        let value = serde_json::to_value(&tool).unwrap();
        assert!(value.get("inputSchema").is_some());
    }

    #[test]
    fn required_arguments_reads_schema() {
        let tool = Tool::new(
            "lookup",
            None,
            json!({
                "type": "object",
                "properties": {"key": {"type": "string"}, "limit": {"type": "number"}},
                "required": ["key"]
            }),
        );
        assert_eq!(tool.required_arguments(), vec!["key"]);

        let no_required = Tool::new("free", None, json!({"type": "object"}));
        assert!(no_required.required_arguments().is_empty());
    }

    #[test]
    fn list_request_cursor_is_omitted_when_absent() {
        let first = serde_json::to_value(ListToolsRequest::new()).unwrap();
        assert_eq!(first, json!({}));

        let next = serde_json::to_value(ListToolsRequest::with_cursor("c1")).unwrap();
        assert_eq!(next, json!({"cursor": "c1"}));
    }

    #[test]
    fn call_tool_response_error_flag() {
        let response: CallToolResponse = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "boom"}],
            "isError": true
        }))
        .unwrap();
        assert_eq!(response.is_error, Some(true));
        assert_eq!(response.content[0].as_text(), Some("boom"));
    }
}

//! Resource Messages
//!
//! Types for `resources/list`, `resources/templates/list`, `resources/read`,
//! and the subscribe/unsubscribe pair.

use serde::{Deserialize, Serialize};

use crate::protocol::content::EmbeddedResource;
use crate::protocol::errors::ProtocolResult;
use crate::protocol::types::Uri;

/// A resource advertised by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    /// URI identifying the resource (primary key)
    pub uri: Uri,

    /// Human-readable name for the resource
    pub name: String,

    /// Optional description of the resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Optional MIME type of the resource content
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl Resource {
    /// Create a new resource descriptor
    ///
    /// # Errors
    ///
    /// Returns an error when `uri` fails validation.
    pub fn new(
        uri: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
        mime_type: Option<String>,
    ) -> ProtocolResult<Self> {
        Ok(Self {
            uri: Uri::new(uri)?,
            name: name.into(),
            description,
            mime_type,
        })
    }
}

/// A parameterized resource URI template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceTemplate {
    /// RFC 6570 URI template
    #[serde(rename = "uriTemplate")]
    pub uri_template: String,

    /// Human-readable name for the template
    pub name: String,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Optional MIME type of resources produced by the template
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Parameters of `resources/list`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListResourcesRequest {
    /// Pagination cursor from a previous response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Result payload of `resources/list`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListResourcesResponse {
    /// The advertised resources
    pub resources: Vec<Resource>,

    /// Cursor for the next page, when more resources exist
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Parameters of `resources/templates/list`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListResourceTemplatesRequest {
    /// Pagination cursor from a previous response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Result payload of `resources/templates/list`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListResourceTemplatesResponse {
    /// The advertised templates
    #[serde(rename = "resourceTemplates")]
    pub resource_templates: Vec<ResourceTemplate>,

    /// Cursor for the next page
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Parameters of `resources/read`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadResourceRequest {
    /// URI of the resource to read
    pub uri: Uri,
}

impl ReadResourceRequest {
    /// Create a read request with URI validation
    pub fn new(uri: impl Into<String>) -> ProtocolResult<Self> {
        Ok(Self {
            uri: Uri::new(uri)?,
        })
    }
}

/// Result payload of `resources/read`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadResourceResponse {
    /// The resource bodies (a read may return multiple parts)
    pub contents: Vec<EmbeddedResource>,
}

/// Parameters of `resources/subscribe` and `resources/unsubscribe`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscribeResourceRequest {
    /// URI of the resource to (un)subscribe
    pub uri: Uri,
}

impl SubscribeResourceRequest {
    /// Create a subscribe request with URI validation
    pub fn new(uri: impl Into<String>) -> ProtocolResult<Self> {
        Ok(Self {
            uri: Uri::new(uri)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resource_wire_format() {
        let resource = Resource::new(
            "file:///config.json",
            "Configuration",
            None,
            Some("application/json".to_string()),
        )
        .unwrap();

        let value = serde_json::to_value(&resource).unwrap();
        assert_eq!(value["uri"], "file:///config.json");
        assert_eq!(value["mimeType"], "application/json");
        assert!(value.get("description").is_none());
    }

    #[test]
    fn resource_rejects_invalid_uri() {
        assert!(Resource::new("not a uri", "x", None, None).is_err());
    }

    #[test]
    fn templates_response_parses_camel_case_list() {
        let response: ListResourceTemplatesResponse = serde_json::from_value(json!({
            "resourceTemplates": [
                {"uriTemplate": "file:///{path}", "name": "Files"}
            ]
        }))
        .unwrap();
        assert_eq!(response.resource_templates.len(), 1);
        assert_eq!(response.resource_templates[0].uri_template, "file:///{path}");
    }

    #[test]
    fn read_response_round_trip() {
        let response: ReadResourceResponse = serde_json::from_value(json!({
            "contents": [{"uri": "file:///a", "text": "body", "mimeType": "text/plain"}]
        }))
        .unwrap();
        assert_eq!(response.contents[0].text.as_deref(), Some("body"));
    }
}

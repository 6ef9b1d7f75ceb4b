//! Content Types
//!
//! Content blocks returned from tool calls, resource reads, and prompt
//! messages. Tagged on the wire by a `type` discriminator.

use serde::{Deserialize, Serialize};

use super::types::Uri;

/// A content block exchanged with the peer
///
/// # Examples
///
/// ```rust
/// use tether_mcp::protocol::Content;
///
/// let content = Content::text("Hello, world!");
/// let json = serde_json::to_value(&content).unwrap();
/// assert_eq!(json["type"], "text");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Content {
    /// Plain text content
    #[serde(rename = "text")]
    Text {
        /// The text content
        text: String,
    },

    /// Image content with base64 encoded data
    #[serde(rename = "image")]
    Image {
        /// Base64 encoded image data
        data: String,
        /// MIME type of the image (e.g., "image/png")
        #[serde(rename = "mimeType")]
        mime_type: String,
    },

    /// Embedded resource content
    #[serde(rename = "resource")]
    Resource {
        /// The embedded resource body
        resource: EmbeddedResource,
    },
}

impl Content {
    /// Create text content
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create image content
    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::Image {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// The text payload, when this block is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// A resource body embedded inline in a content block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedResource {
    /// URI identifying the resource
    pub uri: Uri,

    /// Text body, for textual resources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Base64 body, for binary resources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,

    /// MIME type of the resource content
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

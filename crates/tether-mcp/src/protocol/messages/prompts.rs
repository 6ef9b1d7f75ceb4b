//! Prompt Messages
//!
//! Types for `prompts/list` and `prompts/get`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::protocol::content::Content;

/// A prompt advertised by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prompt {
    /// Unique prompt name within the server
    pub name: String,

    /// Optional description of the prompt's purpose
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Arguments the prompt accepts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<PromptArgument>>,
}

impl Prompt {
    /// Names of arguments marked required
    pub fn required_arguments(&self) -> Vec<&str> {
        self.arguments
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|argument| argument.required.unwrap_or(false))
            .map(|argument| argument.name.as_str())
            .collect()
    }
}

/// A single argument accepted by a prompt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptArgument {
    /// Argument name
    pub name: String,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the argument must be supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// One message of an expanded prompt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptMessage {
    /// Speaker role ("user" or "assistant")
    pub role: String,

    /// Message content block
    pub content: Content,
}

/// Parameters of `prompts/list`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListPromptsRequest {
    /// Pagination cursor from a previous response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Result payload of `prompts/list`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListPromptsResponse {
    /// The advertised prompts
    pub prompts: Vec<Prompt>,

    /// Cursor for the next page
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Parameters of `prompts/get`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetPromptRequest {
    /// Name of the prompt to expand
    pub name: String,

    /// Argument values keyed by argument name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<HashMap<String, String>>,
}

impl GetPromptRequest {
    /// Create a get-prompt request
    pub fn new(name: impl Into<String>, arguments: Option<HashMap<String, String>>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Result payload of `prompts/get`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetPromptResponse {
    /// Optional description of the expansion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The expanded prompt messages
    pub messages: Vec<PromptMessage>,
}

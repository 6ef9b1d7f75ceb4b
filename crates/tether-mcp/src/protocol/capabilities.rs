//! Capability Negotiation Types
//!
//! The `{tools, prompts, resources, sampling, experimental}` feature flags
//! each side advertises during the initialize handshake. Absent fields mean
//! the capability is not offered; empty objects mean offered with defaults.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Capability flags advertised by the client in `initialize`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientCapabilities {
    /// Tool support flags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolCapabilities>,

    /// Prompt support flags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptCapabilities>,

    /// Resource support flags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceCapabilities>,

    /// Whether the client can service `sampling/createMessage`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingCapabilities>,

    /// Non-standard capability extensions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, Value>>,
}

impl ClientCapabilities {
    /// Capabilities advertising nothing beyond the base protocol
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Capabilities advertising sampling support
    pub fn with_sampling() -> Self {
        Self {
            sampling: Some(SamplingCapabilities::default()),
            ..Self::default()
        }
    }
}

/// Capability flags returned by the server in the initialize response
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerCapabilities {
    /// Tool support flags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolCapabilities>,

    /// Prompt support flags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptCapabilities>,

    /// Resource support flags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceCapabilities>,

    /// Logging message support
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<Value>,

    /// Non-standard capability extensions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, Value>>,
}

impl ServerCapabilities {
    /// Capabilities advertising nothing beyond the base protocol
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Whether the server offers tools
    pub fn has_tools(&self) -> bool {
        self.tools.is_some()
    }

    /// Whether the server offers prompts
    pub fn has_prompts(&self) -> bool {
        self.prompts.is_some()
    }

    /// Whether the server offers resources
    pub fn has_resources(&self) -> bool {
        self.resources.is_some()
    }

    /// Whether the server supports resource subscriptions
    pub fn supports_resource_subscriptions(&self) -> bool {
        self.resources
            .as_ref()
            .is_some_and(|r| r.subscribe.unwrap_or(false))
    }
}

/// Tool capability flags
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCapabilities {
    /// Whether `notifications/tools/list_changed` is emitted
    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Prompt capability flags
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptCapabilities {
    /// Whether `notifications/prompts/list_changed` is emitted
    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Resource capability flags
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceCapabilities {
    /// Whether per-resource `resources/subscribe` is supported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<bool>,

    /// Whether `notifications/resources/list_changed` is emitted
    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Sampling capability flags (currently an empty marker object)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SamplingCapabilities {}

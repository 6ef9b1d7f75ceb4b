//! Typed MCP Method Messages
//!
//! Request parameter and result payload types for every MCP method the
//! runtime speaks, grouped by feature area.

pub mod initialization;
pub mod notifications;
pub mod prompts;
pub mod resources;
pub mod tools;

pub use initialization::{InitializeRequest, InitializeResponse};
pub use notifications::{
    CancelledParams, LoggingMessageParams, ProgressParams, ResourceUpdatedParams,
};
pub use prompts::{
    GetPromptRequest, GetPromptResponse, ListPromptsRequest, ListPromptsResponse, Prompt,
    PromptArgument, PromptMessage,
};
pub use resources::{
    ListResourceTemplatesRequest, ListResourceTemplatesResponse, ListResourcesRequest,
    ListResourcesResponse, ReadResourceRequest, ReadResourceResponse, Resource, ResourceTemplate,
    SubscribeResourceRequest,
};
pub use tools::{
    CallToolRequest, CallToolResponse, ListToolsRequest, ListToolsResponse, Tool,
};

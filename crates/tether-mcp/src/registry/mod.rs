//! Feature Registries
//!
//! Host-facing registries for the three MCP feature families. The runtime
//! provides registration, uniqueness, validation, and dispatch; handler
//! business logic belongs to the host application.

pub mod prompts;
pub mod resources;
pub mod tools;

pub use prompts::{PromptHandler, PromptRegistry};
pub use resources::{ResourceHandler, ResourceRegistry};
pub use tools::{ToolHandler, ToolRegistry};

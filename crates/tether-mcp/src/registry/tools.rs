//! Tool Registry
//!
//! Host-facing name-to-handler map backing `tools/list` and `tools/call`.
//! The runtime owns registration, uniqueness, and argument validation;
//! the business logic of each tool belongs to the host application.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

// Layer 3: Internal module imports
use crate::error::{McpError, McpResult};
use crate::protocol::{Content, Tool};

/// Callable behind a registered tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with validated arguments
    async fn call(&self, arguments: Value) -> McpResult<Vec<Content>>;
}

/// Adapter so plain closures can be registered as tool handlers
struct FnToolHandler<F>(F);

#[async_trait]
impl<F> ToolHandler for FnToolHandler<F>
where
    F: Fn(Value) -> McpResult<Vec<Content>> + Send + Sync,
{
    async fn call(&self, arguments: Value) -> McpResult<Vec<Content>> {
        (self.0)(arguments)
    }
}

struct RegisteredTool {
    tool: Tool,
    handler: Arc<dyn ToolHandler>,
}

/// Name-to-handler registry for tools
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use tether_mcp::protocol::{Content, Tool};
/// use tether_mcp::registry::ToolRegistry;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = ToolRegistry::new();
/// registry.register_fn(
///     Tool::new("echo", None, json!({
///         "type": "object",
///         "properties": {"text": {"type": "string"}},
///         "required": ["text"]
///     })),
///     |arguments| {
///         let text = arguments["text"].as_str().unwrap_or_default();
///         Ok(vec![Content::text(text)])
///     },
/// )?;
///
/// let content = registry.execute("echo", json!({"text": "hi"})).await?;
/// assert_eq!(content[0].as_text(), Some("hi"));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ToolRegistry {
    tools: DashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool with its handler
    ///
    /// # Errors
    ///
    /// Fails with `Validation` when the name is already taken.
    pub fn register(&self, tool: Tool, handler: Arc<dyn ToolHandler>) -> McpResult<()> {
        let name = tool.name.clone();
        match self.tools.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(McpError::validation(format!(
                "tool already registered: {name}"
            ))),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                debug!(tool = %name, "tool registered");
                entry.insert(RegisteredTool { tool, handler });
                Ok(())
            }
        }
    }

    /// Register a plain closure as a tool handler
    pub fn register_fn<F>(&self, tool: Tool, handler: F) -> McpResult<()>
    where
        F: Fn(Value) -> McpResult<Vec<Content>> + Send + Sync + 'static,
    {
        self.register(tool, Arc::new(FnToolHandler(handler)))
    }

    /// Remove a tool; returns whether it existed
    pub fn unregister(&self, name: &str) -> bool {
        self.tools.remove(name).is_some()
    }

    /// All registered tool descriptors
    pub fn list(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .map(|entry| entry.value().tool.clone())
            .collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name
    ///
    /// Validates that the tool exists and that every argument the input
    /// schema marks required is present, then dispatches to the handler.
    pub async fn execute(&self, name: &str, arguments: Value) -> McpResult<Vec<Content>> {
        let handler = {
            let entry = self
                .tools
                .get(name)
                .ok_or_else(|| McpError::validation(format!("unknown tool: {name}")))?;

            for required in entry.value().tool.required_arguments() {
                if arguments.get(required).is_none() {
                    return Err(McpError::validation(format!(
                        "tool {name} requires argument '{required}'"
                    )));
                }
            }
            Arc::clone(&entry.value().handler)
        };

        handler.call(arguments).await
    }
}

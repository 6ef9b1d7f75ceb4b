//! Prompt Registry
//!
//! Host-facing name-to-handler map backing `prompts/list` and
//! `prompts/get`, with required-argument validation before dispatch.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

// Layer 3: Internal module imports
use crate::error::{McpError, McpResult};
use crate::protocol::{GetPromptResponse, Prompt};

/// Callable behind a registered prompt
#[async_trait]
pub trait PromptHandler: Send + Sync {
    /// Expand the prompt with validated arguments
    async fn get(&self, arguments: HashMap<String, String>) -> McpResult<GetPromptResponse>;
}

struct FnPromptHandler<F>(F);

#[async_trait]
impl<F> PromptHandler for FnPromptHandler<F>
where
    F: Fn(HashMap<String, String>) -> McpResult<GetPromptResponse> + Send + Sync,
{
    async fn get(&self, arguments: HashMap<String, String>) -> McpResult<GetPromptResponse> {
        (self.0)(arguments)
    }
}

struct RegisteredPrompt {
    prompt: Prompt,
    handler: Arc<dyn PromptHandler>,
}

/// Name-to-handler registry for prompts
#[derive(Default)]
pub struct PromptRegistry {
    prompts: DashMap<String, RegisteredPrompt>,
}

impl PromptRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prompt with its handler
    ///
    /// # Errors
    ///
    /// Fails with `Validation` when the name is already taken.
    pub fn register(&self, prompt: Prompt, handler: Arc<dyn PromptHandler>) -> McpResult<()> {
        let name = prompt.name.clone();
        match self.prompts.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(McpError::validation(format!(
                "prompt already registered: {name}"
            ))),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                debug!(prompt = %name, "prompt registered");
                entry.insert(RegisteredPrompt { prompt, handler });
                Ok(())
            }
        }
    }

    /// Register a plain closure as a prompt handler
    pub fn register_fn<F>(&self, prompt: Prompt, handler: F) -> McpResult<()>
    where
        F: Fn(HashMap<String, String>) -> McpResult<GetPromptResponse> + Send + Sync + 'static,
    {
        self.register(prompt, Arc::new(FnPromptHandler(handler)))
    }

    /// Remove a prompt; returns whether it existed
    pub fn unregister(&self, name: &str) -> bool {
        self.prompts.remove(name).is_some()
    }

    /// All registered prompt descriptors
    pub fn list(&self) -> Vec<Prompt> {
        self.prompts
            .iter()
            .map(|entry| entry.value().prompt.clone())
            .collect()
    }

    /// Number of registered prompts
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Expand a prompt by name
    pub async fn get(
        &self,
        name: &str,
        arguments: HashMap<String, String>,
    ) -> McpResult<GetPromptResponse> {
        let handler = {
            let entry = self
                .prompts
                .get(name)
                .ok_or_else(|| McpError::validation(format!("unknown prompt: {name}")))?;

            for required in entry.value().prompt.required_arguments() {
                if !arguments.contains_key(required) {
                    return Err(McpError::validation(format!(
                        "prompt {name} requires argument '{required}'"
                    )));
                }
            }
            Arc::clone(&entry.value().handler)
        };

        handler.get(arguments).await
    }
}

//! Resource Registry
//!
//! Host-facing URI-to-handler map backing `resources/list` and
//! `resources/read`. A resource's URI is its primary key; names are
//! descriptive only.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

// Layer 3: Internal module imports
use crate::error::{McpError, McpResult};
use crate::protocol::{EmbeddedResource, Resource, ResourceTemplate};

/// Callable behind a registered resource
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Produce the resource bodies for a read
    async fn read(&self) -> McpResult<Vec<EmbeddedResource>>;
}

struct FnResourceHandler<F>(F);

#[async_trait]
impl<F> ResourceHandler for FnResourceHandler<F>
where
    F: Fn() -> McpResult<Vec<EmbeddedResource>> + Send + Sync,
{
    async fn read(&self) -> McpResult<Vec<EmbeddedResource>> {
        (self.0)()
    }
}

struct RegisteredResource {
    resource: Resource,
    handler: Arc<dyn ResourceHandler>,
}

/// URI-to-handler registry for resources
#[derive(Default)]
pub struct ResourceRegistry {
    resources: DashMap<String, RegisteredResource>,
    templates: DashMap<String, ResourceTemplate>,
}

impl ResourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource with its handler, keyed by URI
    ///
    /// # Errors
    ///
    /// Fails with `Validation` when the URI is already registered.
    pub fn register(
        &self,
        resource: Resource,
        handler: Arc<dyn ResourceHandler>,
    ) -> McpResult<()> {
        let uri = resource.uri.to_string();
        match self.resources.entry(uri.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(McpError::validation(format!(
                "resource already registered: {uri}"
            ))),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                debug!(uri = %uri, "resource registered");
                entry.insert(RegisteredResource { resource, handler });
                Ok(())
            }
        }
    }

    /// Register a plain closure as a resource handler
    pub fn register_fn<F>(&self, resource: Resource, handler: F) -> McpResult<()>
    where
        F: Fn() -> McpResult<Vec<EmbeddedResource>> + Send + Sync + 'static,
    {
        self.register(resource, Arc::new(FnResourceHandler(handler)))
    }

    /// Register a resource template
    pub fn register_template(&self, template: ResourceTemplate) -> McpResult<()> {
        let key = template.uri_template.clone();
        match self.templates.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(McpError::validation(format!(
                "resource template already registered: {key}"
            ))),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(template);
                Ok(())
            }
        }
    }

    /// Remove a resource; returns whether it existed
    pub fn unregister(&self, uri: &str) -> bool {
        self.resources.remove(uri).is_some()
    }

    /// All registered resource descriptors
    pub fn list(&self) -> Vec<Resource> {
        self.resources
            .iter()
            .map(|entry| entry.value().resource.clone())
            .collect()
    }

    /// All registered resource templates
    pub fn list_templates(&self) -> Vec<ResourceTemplate> {
        self.templates
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of registered resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Read a resource by URI
    pub async fn read(&self, uri: &str) -> McpResult<Vec<EmbeddedResource>> {
        let handler = {
            let entry = self
                .resources
                .get(uri)
                .ok_or_else(|| McpError::validation(format!("unknown resource: {uri}")))?;
            Arc::clone(&entry.value().handler)
        };
        handler.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Uri;

    fn config_resource() -> Resource {
        Resource::new(
            "file:///etc/app.conf",
            "App configuration",
            None,
            Some("text/plain".to_string()),
        )
        .unwrap()
    }

    fn body(text: &str) -> EmbeddedResource {
        EmbeddedResource {
            uri: Uri::new("file:///etc/app.conf").unwrap(),
            text: Some(text.to_string()),
            blob: None,
            mime_type: Some("text/plain".to_string()),
        }
    }

    #[tokio::test]
    async fn register_list_read() {
        let registry = ResourceRegistry::new();
        registry
            .register_fn(config_resource(), || Ok(vec![body("key=value")]))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list()[0].name, "App configuration");

        let contents = registry.read("file:///etc/app.conf").await.unwrap();
        assert_eq!(contents[0].text.as_deref(), Some("key=value"));
    }

    #[tokio::test]
    async fn uri_is_the_primary_key() {
        let registry = ResourceRegistry::new();
        registry
            .register_fn(config_resource(), || Ok(vec![]))
            .unwrap();

        // Same URI, different name: still a duplicate.
        let duplicate = Resource::new("file:///etc/app.conf", "Other name", None, None).unwrap();
        assert!(registry.register_fn(duplicate, || Ok(vec![])).is_err());
    }

    #[tokio::test]
    async fn unknown_uri_fails() {
        let registry = ResourceRegistry::new();
        let err = registry.read("file:///ghost").await.unwrap_err();
        assert!(matches!(err, McpError::Validation { .. }));
    }

    #[tokio::test]
    async fn templates_are_tracked_separately() {
        let registry = ResourceRegistry::new();
        registry
            .register_template(ResourceTemplate {
                uri_template: "file:///{path}".to_string(),
                name: "Files".to_string(),
                description: None,
                mime_type: None,
            })
            .unwrap();

        assert_eq!(registry.list_templates().len(), 1);
        assert!(registry.is_empty());
    }
}

//! Capability registry.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::{Invoke, Tool, ToolProvider};

/// Prefix marking a provider as disabled.
const EXCLUDED_PREFIX: char = '_';

/// A named, invocable capability.
#[derive(Clone)]
pub struct Capability {
    pub name: String,
    pub description: String,
    /// Argument schema, forwarded to the prompt untouched.
    pub schema: Value,
    pub invoke: Arc<dyn Invoke>,
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Name-keyed capabilities, kept in registration order.
#[derive(Debug, Default, Clone)]
pub struct ToolRegistry {
    capabilities: Vec<Capability>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry by letting each provider register itself.
    pub fn from_providers(providers: &[Box<dyn ToolProvider>]) -> Self {
        let mut registry = Self::new();
        registry.register_providers(providers);
        registry
    }

    /// Let each provider register itself, skipping excluded ones.
    pub fn register_providers(&mut self, providers: &[Box<dyn ToolProvider>]) {
        for provider in providers {
            if provider.name().starts_with(EXCLUDED_PREFIX) {
                tracing::debug!("Skipping excluded tool provider {}", provider.name());
                continue;
            }
            provider.register(self);
        }
        tracing::debug!("Registered {} tools", self.len());
    }

    /// Insert a capability. Re-registering a name replaces it in place.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        invoke: Arc<dyn Invoke>,
        description: impl Into<String>,
        schema: Value,
    ) {
        let capability = Capability {
            name: name.into(),
            description: description.into(),
            schema,
            invoke,
        };

        match self.index.get(&capability.name) {
            Some(&slot) => self.capabilities[slot] = capability,
            None => {
                self.index
                    .insert(capability.name.clone(), self.capabilities.len());
                self.capabilities.push(capability);
            }
        }
    }

    /// Register a self-describing tool.
    pub fn register_tool<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        let description = tool.description().to_string();
        let schema = tool.parameters_schema();
        self.register(name, Arc::new(tool), description, schema);
    }

    pub fn lookup(&self, name: &str) -> Option<&Capability> {
        self.index.get(name).map(|&slot| &self.capabilities[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Capabilities in registration order.
    pub fn list(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn names(&self) -> Vec<&str> {
        self.capabilities.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// One line per capability: name, description and argument schema.
    pub fn render_catalog(&self) -> String {
        self.capabilities
            .iter()
            .map(|c| format!("- {}: {}. Args schema: {}", c.name, c.description, c.schema))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

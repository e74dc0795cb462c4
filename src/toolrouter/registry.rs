//! Frozen-at-startup registry mapping tool names to their schema, and tool
//! categories to the handler that executes them.

use std::{collections::HashMap, sync::Arc};

use super::handler::ToolHandler;
use super::schema::{ToolCategory, ToolSchema};

/// Registered once at boot (per Design Notes: "new handlers must not
/// require modifying the Router"). Adding a tool means adding a schema plus,
/// if its category has no handler yet, one handler registration.
pub struct ToolRegistry {
    schemas: HashMap<String, ToolSchema>,
    handlers: HashMap<ToolCategory, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
            handlers: HashMap::new(),
        }
    }

    pub fn register_schema(&mut self, schema: ToolSchema) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn register_handler(&mut self, category: ToolCategory, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(category, handler);
    }

    pub fn schema(&self, tool_name: &str) -> Option<&ToolSchema> {
        self.schemas.get(tool_name)
    }

    pub fn handler_for(&self, category: ToolCategory) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(&category).cloned()
    }

    pub fn list_schemas(&self) -> Vec<&ToolSchema> {
        self.schemas.values().collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

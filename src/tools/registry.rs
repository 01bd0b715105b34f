//! Tool registry: name -> descriptor + handler.

use crate::error::{Result, ToolError};
use crate::protocol::{CallToolParams, CallToolResult, Tool};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// A registered, schema-described callable operation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// The immutable descriptor exposed via `tools/list`.
    fn definition(&self) -> Tool;

    /// Execute with already-decoded JSON arguments. Each invocation is
    /// independent; handlers hold no cross-call state.
    async fn execute(&self, arguments: Value) -> Result<CallToolResult>;

    /// Canned arguments used by the self-test endpoint.
    fn test_arguments(&self) -> Value;
}

/// Registry of callable tools. Populated once at startup and read-only
/// afterwards, so lookups from concurrent dispatches need no coordination.
pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn ToolHandler>>,
    // DashMap iteration order is arbitrary; list() must follow registration order.
    order: RwLock<Vec<String>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Register a tool. Names are unique; re-registering a name fails.
    pub fn register<T: ToolHandler + 'static>(&self, tool: T) -> std::result::Result<(), ToolError> {
        let definition = tool.definition();
        let name = definition.name.clone();

        match self.tools.entry(name.clone()) {
            Entry::Occupied(_) => Err(ToolError::Duplicate(name)),
            Entry::Vacant(slot) => {
                debug!("Registering tool: {}", name);
                slot.insert(Arc::new(tool));
                self.order.write().push(name);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).map(|r| Arc::clone(&*r))
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> Vec<Tool> {
        self.order
            .read()
            .iter()
            .filter_map(|name| self.get(name).map(|t| t.definition()))
            .collect()
    }

    /// Tool names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.order.read().clone()
    }

    /// Look up the named tool and invoke it.
    pub async fn execute(&self, params: CallToolParams) -> Result<CallToolResult> {
        let tool = self
            .get(&params.name)
            .ok_or_else(|| ToolError::NotFound(params.name.clone()))?;

        tool.execute(params.arguments).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

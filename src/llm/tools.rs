//! Model-callable tools
//!
//! A tool declares itself with a JSON-schema `ToolDefinition` and is executed
//! with the raw argument string the model produced. Tool outcomes are always
//! JSON values: a tool that cannot run reports that in its output instead of
//! failing the surrounding completion.

use crate::types::ToolDefinition;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn call(&self, arguments: &str) -> Value;
}

/// The set of tools offered to one completion
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Run the named tool. Unknown names produce an error payload.
    pub async fn execute(&self, name: &str, arguments: &str) -> Value {
        match self.tools.iter().find(|t| t.definition().name == name) {
            Some(tool) => tool.call(arguments).await,
            None => json!({
                "success": false,
                "error_message": format!("Unknown tool: {}", name),
            }),
        }
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.tools.iter().map(|t| t.definition().name).collect();
        f.debug_struct("ToolSet").field("tools", &names).finish()
    }
}

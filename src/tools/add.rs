//! Tool: add two numbers.

use crate::error::{Result, ToolError};
use crate::protocol::{CallToolResult, Tool};
use crate::tools::registry::ToolHandler;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct AddArgs {
    pub a: f64,
    pub b: f64,
}

/// Adds two numbers with ordinary floating-point semantics and returns the
/// decimal string of the sum.
pub struct AddTool;

impl AddTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AddTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for AddTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "add".into(),
            description: Some("Add two numbers together".into()),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "a": {
                        "type": "number",
                        "description": "First number"
                    },
                    "b": {
                        "type": "number",
                        "description": "Second number"
                    }
                },
                "required": ["a", "b"]
            }),
        }
    }

    #[instrument(skip(self, arguments), fields(tool = "add"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: AddArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let sum = args.a + args.b;
        tracing::debug!("Executing add: {} + {} = {}", args.a, args.b, sum);

        // f64 Display drops the trailing ".0" for whole numbers: 5, not 5.0.
        Ok(CallToolResult::text(sum.to_string()))
    }

    fn test_arguments(&self) -> Value {
        serde_json::json!({ "a": 5, "b": 3 })
    }
}

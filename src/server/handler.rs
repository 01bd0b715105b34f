//! MCP request handler implementation.

use crate::error::{GatewayError, ProtocolResult};
use crate::protocol::{
    CallToolParams, CallToolResult, Handler, InitializeParams, InitializeResult, ListToolsResult,
    ServerCapabilities, ServerInfo, ToolsCapability, MCP_VERSION,
};
use crate::server::state::ServerState;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Gateway request handler that processes protocol messages against the
/// tool registry. Transport-independent: every binding shares one instance.
pub struct GatewayHandler {
    state: Arc<ServerState>,
}

impl GatewayHandler {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Invoke every registered tool with its canned arguments and report
    /// per-tool success or failure. A failing tool never fails the report.
    pub async fn self_test(&self) -> Value {
        let mut results = serde_json::Map::new();

        for name in self.state.tools.names() {
            let Some(tool) = self.state.tools.get(&name) else {
                continue;
            };

            let outcome = match tool.execute(tool.test_arguments()).await {
                Ok(result) => serde_json::json!({
                    "success": true,
                    "result": result,
                }),
                Err(e) => serde_json::json!({
                    "success": false,
                    "error": e.to_string(),
                }),
            };
            results.insert(name, outcome);
        }

        Value::Object(results)
    }
}

#[async_trait]
impl Handler for GatewayHandler {
    async fn initialize(&self, params: InitializeParams) -> ProtocolResult<InitializeResult> {
        self.state.record_request();
        info!(
            "Initialize request from {} v{}",
            params.client_info.name, params.client_info.version
        );

        let capabilities = ServerCapabilities {
            tools: Some(ToolsCapability {
                list_changed: Some(false),
            }),
        };

        let instructions = format!(
            "Tool gateway. Available tools: {}.",
            self.state.tools.names().join(", ")
        );

        Ok(InitializeResult {
            protocol_version: MCP_VERSION.into(),
            capabilities,
            server_info: ServerInfo {
                name: self.state.config.name.to_string(),
                version: self.state.config.version.to_string(),
            },
            instructions: Some(instructions),
        })
    }

    async fn initialized(&self) -> ProtocolResult<()> {
        info!("Client initialization complete");
        Ok(())
    }

    async fn list_tools(&self) -> ProtocolResult<ListToolsResult> {
        self.state.record_request();
        let tools = self.state.tools.list();
        debug!("Listing {} tools", tools.len());

        Ok(ListToolsResult { tools })
    }

    async fn call_tool(&self, params: CallToolParams) -> ProtocolResult<CallToolResult> {
        self.state.record_request();
        debug!("Tool call: {}", params.name);

        self.state.tools.execute(params).await.map_err(|e| match e {
            GatewayError::Tool(tool_error) => tool_error.into(),
            other => crate::error::ProtocolError::InternalError(other.to_string().into()),
        })
    }
}

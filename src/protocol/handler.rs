//! Request handler and method dispatcher.
//!
//! The dispatcher is the single dispatch path shared by every transport:
//! stdio, SSE, and streaming-HTTP all feed requests through
//! [`Dispatcher::dispatch`] and get identical semantics back.

use crate::error::{ProtocolError, ProtocolResult, ToolError};
use crate::protocol::types::*;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Handler trait for processing MCP requests.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle initialize request.
    async fn initialize(&self, params: InitializeParams) -> ProtocolResult<InitializeResult>;

    /// Handle initialized notification.
    async fn initialized(&self) -> ProtocolResult<()>;

    /// List available tools.
    async fn list_tools(&self) -> ProtocolResult<ListToolsResult>;

    /// Call a tool.
    async fn call_tool(&self, params: CallToolParams) -> ProtocolResult<CallToolResult>;

    /// Handle ping request.
    async fn ping(&self) -> ProtocolResult<Value> {
        Ok(serde_json::json!({}))
    }
}

/// Method dispatcher that routes requests to the appropriate handler method.
pub struct Dispatcher<H: Handler> {
    handler: Arc<H>,
}

impl<H: Handler> Dispatcher<H> {
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Dispatch a request and produce the outbound response envelope.
    ///
    /// Every call is logged with its outcome; failures become coded JSON-RPC
    /// error responses and never propagate out of this function.
    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Dispatching request");

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params).await,
            "initialized" => self.handle_initialized().await,
            "ping" => self.handle_ping().await,
            "tools/list" => self.handle_list_tools().await,
            "tools/call" => self.handle_call_tool(request.params).await,
            method => {
                warn!("Unknown method: {}", method);
                Err(ProtocolError::MethodNotFound(method.to_string()))
            }
        };

        match result {
            Ok(value) => {
                info!("Request succeeded");
                JsonRpcResponse::success(request.id, value)
            }
            Err(e) => {
                error!("Request failed: {}", e);
                JsonRpcResponse::error(request.id, JsonRpcError::new(e.code(), e.to_string()))
            }
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> ProtocolResult<Value> {
        let params: InitializeParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| ProtocolError::InvalidParams(e.to_string().into()))?
            .unwrap_or_default();

        let result = self.handler.initialize(params).await?;
        serde_json::to_value(result).map_err(|e| ProtocolError::InternalError(e.to_string().into()))
    }

    async fn handle_initialized(&self) -> ProtocolResult<Value> {
        self.handler.initialized().await?;
        Ok(Value::Null)
    }

    async fn handle_ping(&self) -> ProtocolResult<Value> {
        self.handler.ping().await
    }

    async fn handle_list_tools(&self) -> ProtocolResult<Value> {
        let result = self.handler.list_tools().await?;
        serde_json::to_value(result).map_err(|e| ProtocolError::InternalError(e.to_string().into()))
    }

    /// Call the tool and reduce its result to the joined result text.
    /// A result with no text content is a failed call.
    async fn handle_call_tool(&self, params: Option<Value>) -> ProtocolResult<Value> {
        let params: CallToolParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| ProtocolError::InvalidParams(e.to_string().into()))?
            .ok_or_else(|| ProtocolError::InvalidParams("Missing params".into()))?;

        let name = params.name.clone();
        let result = self.handler.call_tool(params).await?;

        match result.joined_text() {
            Some(text) => Ok(Value::String(text)),
            None => Err(ToolError::EmptyResult(name).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct MockHandler {
        initialized: AtomicBool,
    }

    impl MockHandler {
        fn new() -> Self {
            Self {
                initialized: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl Handler for MockHandler {
        async fn initialize(&self, _params: InitializeParams) -> ProtocolResult<InitializeResult> {
            self.initialized.store(true, Ordering::SeqCst);
            Ok(InitializeResult {
                protocol_version: MCP_VERSION.into(),
                capabilities: ServerCapabilities::default(),
                server_info: ServerInfo {
                    name: "test".into(),
                    version: "1.0".into(),
                },
                instructions: None,
            })
        }

        async fn initialized(&self) -> ProtocolResult<()> {
            Ok(())
        }

        async fn list_tools(&self) -> ProtocolResult<ListToolsResult> {
            Ok(ListToolsResult { tools: vec![] })
        }

        async fn call_tool(&self, params: CallToolParams) -> ProtocolResult<CallToolResult> {
            match params.name.as_str() {
                "echo" => Ok(CallToolResult::text("echoed")),
                "silent" => Ok(CallToolResult { content: vec![] }),
                other => Err(ToolError::NotFound(other.to_string()).into()),
            }
        }
    }

    fn dispatcher() -> Dispatcher<MockHandler> {
        Dispatcher::new(Arc::new(MockHandler::new()))
    }

    #[tokio::test]
    async fn test_dispatcher_initialize() {
        let handler = Arc::new(MockHandler::new());
        let dispatcher = Dispatcher::new(handler.clone());

        let request = JsonRpcRequest::new("initialize")
            .with_id(1)
            .with_params(serde_json::json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {
                    "name": "test-client",
                    "version": "1.0"
                }
            }));

        let response = dispatcher.dispatch(request).await;
        assert!(response.result.is_some());
        assert!(response.error.is_none());
        assert!(handler.initialized.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_dispatcher_initialize_without_params() {
        let request = JsonRpcRequest::new("initialize").with_id(7);
        let response = dispatcher().dispatch(request).await;
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_dispatcher_unknown_method() {
        let request = JsonRpcRequest::new("foo/bar").with_id(1);
        let response = dispatcher().dispatch(request).await;

        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_dispatcher_call_reduces_to_text() {
        let request = JsonRpcRequest::new("tools/call")
            .with_id(2)
            .with_params(serde_json::json!({"name": "echo", "arguments": {}}));
        let response = dispatcher().dispatch(request).await;

        assert_eq!(response.result, Some(Value::String("echoed".into())));
    }

    #[tokio::test]
    async fn test_dispatcher_call_unknown_tool_echoes_id() {
        let request = JsonRpcRequest::new("tools/call")
            .with_id("req-42")
            .with_params(serde_json::json!({"name": "unknown", "arguments": {}}));
        let response = dispatcher().dispatch(request).await;

        assert_eq!(response.id, Some(RequestId::String("req-42".into())));
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn test_dispatcher_empty_result_is_internal_error() {
        let request = JsonRpcRequest::new("tools/call")
            .with_id(3)
            .with_params(serde_json::json!({"name": "silent", "arguments": {}}));
        let response = dispatcher().dispatch(request).await;

        let error = response.error.unwrap();
        assert_eq!(error.code, -32603);
        assert!(error.message.contains("no text content"));
    }

    #[tokio::test]
    async fn test_dispatcher_call_without_params() {
        let request = JsonRpcRequest::new("tools/call").with_id(4);
        let response = dispatcher().dispatch(request).await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_dispatcher_ping() {
        let request = JsonRpcRequest::new("ping").with_id(5);
        let response = dispatcher().dispatch(request).await;
        assert_eq!(response.result, Some(serde_json::json!({})));
    }
}

//! Networked transport: streaming-HTTP POST, SSE keep-alive channel, and the
//! operational endpoints (health probe, tool self-test).
//!
//! All routes share the same dispatcher as the stdio binding, so every
//! transport converges on identical tool lists, results, and error codes.
//! The `/mcp` endpoint is one envelope in, one envelope out per request - a
//! simplification of the streamable-HTTP protocol variant.

use crate::error::Result;
use crate::protocol::{Dispatcher, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::server::{GatewayHandler, HealthSnapshot, ServerState};
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// HTTP transport binding the shared dispatch path to a listen socket.
pub struct HttpTransport {
    state: Arc<ServerState>,
    handler: Arc<GatewayHandler>,
    dispatcher: Dispatcher<GatewayHandler>,
}

impl HttpTransport {
    pub fn new(state: Arc<ServerState>, handler: Arc<GatewayHandler>) -> Self {
        let dispatcher = Dispatcher::new(Arc::clone(&handler));
        Self {
            state,
            handler,
            dispatcher,
        }
    }

    /// Serve until the shutdown future resolves.
    pub async fn serve(
        self: Arc<Self>,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("HTTP transport listening on {}", addr);
        info!("Endpoints: POST /mcp, GET /sse, GET /health, GET /test-tools");

        let app = router(self);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

/// Build the axum Router. Every response permits cross-origin access.
pub fn router(ctx: Arc<HttpTransport>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/mcp", post(handle_rpc))
        // The SSE binding's RPC traffic arrives on the POST side of the
        // same path and is routed to the shared dispatcher.
        .route("/sse", get(handle_sse).post(handle_rpc))
        .route("/test-tools", get(handle_test_tools))
        .layer(cors)
        .with_state(ctx)
}

/// One JSON-RPC envelope in, one envelope out.
async fn handle_rpc(
    State(ctx): State<Arc<HttpTransport>>,
    Json(body): Json<Value>,
) -> Json<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Malformed JSON-RPC request: {}", e);
            return Json(JsonRpcResponse::error(None, JsonRpcError::parse_error()));
        }
    };

    Json(ctx.dispatcher.dispatch(request).await)
}

async fn handle_health(State(ctx): State<Arc<HttpTransport>>) -> Json<HealthSnapshot> {
    Json(ctx.state.health())
}

/// Run every registered tool with canned arguments and report the outcomes.
async fn handle_test_tools(State(ctx): State<Arc<HttpTransport>>) -> Json<Value> {
    let results = ctx.handler.self_test().await;

    Json(serde_json::json!({
        "mode": ctx.state.config.mode,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "tools": ctx.state.tools.names(),
        "testResults": results,
    }))
}

/// Out-of-band keep-alive event sent on the SSE channel.
#[derive(Debug, Clone, Serialize)]
struct PingPayload {
    #[serde(rename = "type")]
    kind: &'static str,
    timestamp: String,
}

/// Infinite stream of ping payloads, one per period. The first ping fires a
/// full period after subscription, matching interval-timer semantics.
fn ping_payloads(period: Duration) -> impl Stream<Item = PingPayload> {
    async_stream::stream! {
        let mut ticks = tokio::time::interval(period);
        ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // An interval's first tick completes immediately; consume it.
        ticks.tick().await;

        loop {
            ticks.tick().await;
            yield PingPayload {
                kind: "ping",
                timestamp: chrono::Utc::now().to_rfc3339(),
            };
        }
    }
}

/// Logs when the client goes away. Dropping the stream drops the interval
/// with it, so no pings outlive the connection.
struct ConnectionGuard;

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        info!("SSE connection closed, ping timer released");
    }
}

/// Long-lived event-stream carrying periodic keep-alive pings.
async fn handle_sse(
    State(ctx): State<Arc<HttpTransport>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    info!("New SSE connection");
    let period = ctx.state.config.sse_ping_interval;

    let stream = async_stream::stream! {
        let _guard = ConnectionGuard;
        let payloads = ping_payloads(period);
        futures::pin_mut!(payloads);

        while let Some(payload) = payloads.next().await {
            match serde_json::to_string(&payload) {
                Ok(json) => yield Ok::<_, Infallible>(Event::default().data(json)),
                Err(e) => warn!("Failed to serialize ping: {}", e),
            }
        }
    };

    Sse::new(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServerConfig, WeatherConfig};
    use crate::server::ServerStateBuilder;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    /// Router over a state whose weather upstream is unreachable.
    fn test_router() -> Router {
        let config = ServerConfig::builder()
            .weather(WeatherConfig {
                base_url: "http://127.0.0.1:9".into(),
                format: "%C+%t".into(),
                timeout: Duration::from_secs(1),
            })
            .build();

        let state = Arc::new(ServerStateBuilder::new().config(config).build().unwrap());
        let handler = Arc::new(GatewayHandler::new(Arc::clone(&state)));
        router(Arc::new(HttpTransport::new(state, handler)))
    }

    fn rpc_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["tools"], serde_json::json!(["add", "weather"]));
    }

    #[tokio::test]
    async fn test_mcp_tools_list() {
        let body = serde_json::json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/list"
        });
        let response = test_router().oneshot(rpc_request("/mcp", body)).await.unwrap();

        let json = body_json(response).await;
        let tools = json["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "add");
        assert_eq!(tools[1]["name"], "weather");
    }

    #[tokio::test]
    async fn test_mcp_add_call() {
        let body = serde_json::json!({
            "jsonrpc": "2.0", "id": 2, "method": "tools/call",
            "params": {"name": "add", "arguments": {"a": 5, "b": 3}}
        });
        let response = test_router().oneshot(rpc_request("/mcp", body)).await.unwrap();

        let json = body_json(response).await;
        assert_eq!(json["result"], "8");
        assert_eq!(json["id"], 2);
    }

    #[tokio::test]
    async fn test_mcp_unknown_method() {
        let body = serde_json::json!({
            "jsonrpc": "2.0", "id": 3, "method": "foo/bar"
        });
        let response = test_router().oneshot(rpc_request("/mcp", body)).await.unwrap();

        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], -32601);
        assert_eq!(json["id"], 3);
    }

    #[tokio::test]
    async fn test_sse_post_matches_mcp_dispatch() {
        let body = serde_json::json!({
            "jsonrpc": "2.0", "id": 4, "method": "tools/list"
        });
        let via_mcp = body_json(
            test_router()
                .oneshot(rpc_request("/mcp", body.clone()))
                .await
                .unwrap(),
        )
        .await;
        let via_sse = body_json(
            test_router()
                .oneshot(rpc_request("/sse", body))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(via_mcp, via_sse);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "https://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }

    #[tokio::test]
    async fn test_test_tools_endpoint_offline() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/test-tools")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["testResults"]["add"]["success"], true);
        assert_eq!(json["testResults"]["weather"]["success"], true);
    }

    #[tokio::test]
    async fn test_sse_endpoint_is_event_stream() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/sse")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("text/event-stream")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_payloads_fire_per_period() {
        let payloads = ping_payloads(Duration::from_secs(30));
        futures::pin_mut!(payloads);

        // Paused time auto-advances, so two full periods elapse instantly.
        let first = payloads.next().await.unwrap();
        let second = payloads.next().await.unwrap();

        assert_eq!(first.kind, "ping");
        assert_eq!(second.kind, "ping");
    }
}

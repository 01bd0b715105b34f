//! MCP tool gateway: callable tools behind one JSON-RPC dispatch path,
//! reachable over stdio, SSE, or streaming-HTTP.
//!
//! Tools ("add", "weather") are registered once at startup into a read-only
//! registry. Each transport adapter feeds requests into the same dispatcher,
//! so every binding exposes the same tool list, results, and error codes.
//!
//! # Example
//!
//! ```no_run
//! use mcp_tool_gateway::{
//!     config::ServerConfig,
//!     protocol::Dispatcher,
//!     server::{GatewayHandler, ServerStateBuilder},
//!     transport::StdioTransport,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let state = Arc::new(
//!         ServerStateBuilder::new()
//!             .config(ServerConfig::default())
//!             .build()?,
//!     );
//!
//!     let handler = Arc::new(GatewayHandler::new(state));
//!     let dispatcher = Dispatcher::new(handler);
//!
//!     StdioTransport::new().serve(&dispatcher).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use config::{ServerConfig, TransportMode, WeatherConfig};
pub use error::{GatewayError, Result};
pub use protocol::{Dispatcher, Handler};
pub use server::{GatewayHandler, ServerState, ServerStateBuilder};
pub use tools::{ToolHandler, ToolRegistry};
pub use transport::{HttpTransport, StdioTransport};

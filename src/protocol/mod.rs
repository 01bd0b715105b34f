//! MCP protocol implementation over JSON-RPC 2.0.

pub mod handler;
pub mod types;

pub use handler::{Dispatcher, Handler};
pub use types::*;

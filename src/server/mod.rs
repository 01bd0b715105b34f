//! Gateway state and request handling.

pub mod handler;
pub mod state;

pub use handler::GatewayHandler;
pub use state::{HealthSnapshot, ServerState, ServerStateBuilder};

//! MCP tool definitions and registry.

pub mod add;
pub mod registry;
pub mod weather;

pub use add::AddTool;
pub use registry::{ToolHandler, ToolRegistry};
pub use weather::WeatherTool;

use crate::config::ServerConfig;
use crate::error::Result;

/// Create the registry and register all tools, in the order clients see them.
pub fn create_registry(config: &ServerConfig) -> Result<ToolRegistry> {
    let registry = ToolRegistry::new();

    registry.register(AddTool::new())?;
    registry.register(WeatherTool::new(config.weather.clone())?)?;

    Ok(registry)
}

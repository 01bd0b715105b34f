//! Server state management.
//!
//! One state object is constructed at startup and shared by reference with
//! the dispatch layer and the transports. The registry inside it is never
//! mutated after the build step.

use crate::config::{ServerConfig, TransportMode};
use crate::error::Result;
use crate::tools::ToolRegistry;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub struct ServerState {
    pub config: ServerConfig,
    pub tools: ToolRegistry,
    started_at: Instant,
    request_count: AtomicU64,
}

/// Point-in-time operational snapshot served by the health probe.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub mode: TransportMode,
    pub server: String,
    pub timestamp: String,
    pub uptime_seconds: f64,
    pub memory_bytes: u64,
    pub requests_served: u64,
    pub tools: Vec<String>,
}

impl ServerState {
    pub fn new(config: ServerConfig, tools: ToolRegistry) -> Self {
        Self {
            config,
            tools,
            started_at: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    pub fn health(&self) -> HealthSnapshot {
        HealthSnapshot {
            status: "healthy",
            mode: self.config.mode,
            server: self.config.name.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: self.uptime().as_secs_f64(),
            memory_bytes: resident_memory_bytes(),
            requests_served: self.request_count(),
            tools: self.tools.names(),
        }
    }
}

/// Best-effort resident set size. 0 where the proc filesystem is absent.
#[cfg(target_os = "linux")]
fn resident_memory_bytes() -> u64 {
    const PAGE_SIZE: u64 = 4096;

    std::fs::read_to_string("/proc/self/statm")
        .ok()
        .and_then(|s| {
            s.split_whitespace()
                .nth(1)
                .and_then(|pages| pages.parse::<u64>().ok())
        })
        .map(|pages| pages * PAGE_SIZE)
        .unwrap_or(0)
}

#[cfg(not(target_os = "linux"))]
fn resident_memory_bytes() -> u64 {
    0
}

pub struct ServerStateBuilder {
    config: Option<ServerConfig>,
}

impl ServerStateBuilder {
    pub fn new() -> Self {
        Self { config: None }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<ServerState> {
        let config = self.config.unwrap_or_default();
        let tools = crate::tools::create_registry(&config)?;
        Ok(ServerState::new(config, tools))
    }
}

impl Default for ServerStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_builder_registers_tools() {
        let state = ServerStateBuilder::new()
            .config(ServerConfig::default())
            .build()
            .unwrap();

        assert_eq!(state.tools.len(), 2);
        assert_eq!(state.tools.names(), vec!["add", "weather"]);
    }

    #[test]
    fn test_health_snapshot() {
        let state = ServerStateBuilder::new().build().unwrap();
        state.record_request();
        state.record_request();

        let health = state.health();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.requests_served, 2);
        assert_eq!(health.tools, vec!["add", "weather"]);
    }
}

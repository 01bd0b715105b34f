//! Configuration types and builders.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::env;
use std::time::Duration;

/// Default listen port for networked mode.
pub const DEFAULT_PORT: u16 = 3000;

/// Default interval between SSE keep-alive pings.
pub const DEFAULT_SSE_PING_INTERVAL: Duration = Duration::from_secs(30);

/// Transport mode, selected exactly once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Stdio framing for local clients.
    #[default]
    Local,
    /// Networked mode: HTTP POST + SSE endpoints.
    Remote,
}

impl TransportMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "local" | "stdio" => Some(Self::Local),
            "remote" | "http" => Some(Self::Remote),
            _ => None,
        }
    }

    /// Mode selection: remote when a port is set, the mode variable says
    /// remote, or the `--remote` flag was passed; local otherwise.
    pub fn detect(port_var: Option<&str>, mode_var: Option<&str>, remote_flag: bool) -> Self {
        if remote_flag || port_var.is_some() {
            return Self::Remote;
        }
        match mode_var.and_then(Self::parse) {
            Some(mode) => mode,
            None => Self::Local,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote)
    }
}

/// Upstream weather endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub base_url: String,
    /// Response format passed through to the upstream as a query parameter.
    pub format: String,
    pub timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://wttr.in".into(),
            format: "%C+%t".into(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: Cow<'static, str>,
    pub version: Cow<'static, str>,
    pub mode: TransportMode,
    pub port: u16,
    pub sse_ping_interval: Duration,
    pub weather: WeatherConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "mcp-tool-gateway".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            mode: TransportMode::default(),
            port: DEFAULT_PORT,
            sse_ping_interval: DEFAULT_SSE_PING_INTERVAL,
            weather: WeatherConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig.
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
    remote_flag: bool,
}

impl ServerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn mode(mut self, mode: TransportMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn sse_ping_interval(mut self, interval: Duration) -> Self {
        self.config.sse_ping_interval = interval;
        self
    }

    pub fn weather(mut self, weather: WeatherConfig) -> Self {
        self.config.weather = weather;
        self
    }

    /// Force remote mode, as the `--remote` command-line flag does.
    pub fn remote_flag(mut self, remote: bool) -> Self {
        self.remote_flag = remote;
        self
    }

    /// Read configuration from environment variables.
    pub fn from_env(mut self) -> Self {
        let port_var = env::var("PORT").ok();
        let mode_var = env::var("MCP_MODE").ok();

        if let Some(port) = port_var.as_deref().and_then(|p| p.parse().ok()) {
            self.config.port = port;
        }

        self.config.mode =
            TransportMode::detect(port_var.as_deref(), mode_var.as_deref(), self.remote_flag);

        if let Ok(url) = env::var("WEATHER_URL") {
            self.config.weather.base_url = url;
        }

        if let Some(secs) = env::var("WEATHER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.config.weather.timeout = Duration::from_secs(secs);
        }

        self
    }

    pub fn build(mut self) -> ServerConfig {
        if self.remote_flag {
            self.config.mode = TransportMode::Remote;
        }
        self.config
    }
}

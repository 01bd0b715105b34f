//! Tool: fetch current weather for a city.

use crate::config::WeatherConfig;
use crate::error::{Result, ToolError};
use crate::protocol::{CallToolResult, Tool};
use crate::tools::registry::ToolHandler;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

#[derive(Debug, Deserialize)]
pub struct WeatherArgs {
    pub city: String,
}

/// Fetches the weather text for a city from an upstream endpoint.
///
/// Upstream flakiness is not a protocol failure: on any network error,
/// timeout, or non-2xx status the tool degrades to a fixed human-readable
/// fallback text instead of raising. Error propagation is reserved for
/// protocol-level failures (bad arguments, unknown tool).
pub struct WeatherTool {
    config: WeatherConfig,
    client: reqwest::Client,
}

impl WeatherTool {
    pub fn new(config: WeatherConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { config, client })
    }

    async fn fetch(&self, city: &str) -> reqwest::Result<String> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), city);

        self.client
            .get(&url)
            .query(&[("format", self.config.format.as_str())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    fn fallback_text(city: &str) -> String {
        format!("Unable to fetch weather for {}. Please try again later.", city)
    }
}

#[async_trait]
impl ToolHandler for WeatherTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "weather".into(),
            description: Some("Get current weather for a city".into()),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "City name"
                    }
                },
                "required": ["city"]
            }),
        }
    }

    #[instrument(skip(self, arguments), fields(tool = "weather"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: WeatherArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let city = args.city.trim().to_string();
        if city.is_empty() {
            return Err(ToolError::InvalidArguments("city must be a non-empty string".into()).into());
        }

        debug!("Fetching weather for: {}", city);

        match self.fetch(&city).await {
            Ok(body) => {
                debug!("Weather response for {}: {}", city, body);
                Ok(CallToolResult::text(body))
            }
            Err(e) => {
                warn!("Weather fetch failed for {}: {}", city, e);
                Ok(CallToolResult::text(Self::fallback_text(&city)))
            }
        }
    }

    fn test_arguments(&self) -> Value {
        serde_json::json!({ "city": "London" })
    }
}

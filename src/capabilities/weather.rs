//! Weather lookups against wttr.in.
//!
//! Uses the `format=j1` JSON endpoint and reads only the current condition.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{CapabilityError, Result, WeatherCapability, WeatherReport};
use crate::config::WeatherSettings;

/// Request timeout for the HTTP client itself.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Name used in capability errors.
const SERVICE_NAME: &str = "weather service";

/// Weather capability backed by a wttr.in compatible service.
#[derive(Debug, Clone)]
pub struct WttrWeather {
    client: Client,
    base_url: String,
    location: String,
}

impl WttrWeather {
    /// Create a client for the configured location.
    pub fn new(settings: &WeatherSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CapabilityError::Unavailable(format!("{SERVICE_NAME} ({e})")))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            location: settings.location.trim().to_string(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/{}?format=j1",
            self.base_url,
            urlencoding::encode(&self.location)
        )
    }
}

#[async_trait]
impl WeatherCapability for WttrWeather {
    #[instrument(skip(self), fields(location = %self.location))]
    async fn current(&self) -> Result<WeatherReport> {
        let url = self.url();
        debug!(url = %url, "Fetching current weather");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!("Weather request failed: {}", e);
                if e.is_timeout() || e.is_connect() {
                    CapabilityError::Unavailable(SERVICE_NAME.to_string())
                } else {
                    CapabilityError::Failed(format!("Weather request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_status(status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CapabilityError::Failed(format!("Weather response interrupted: {e}")))?;
        parse_report(&body)
    }
}

/// Map a non-success HTTP status to a capability error.
fn error_from_status(status: StatusCode) -> CapabilityError {
    match status.as_u16() {
        429 | 500..=599 => CapabilityError::Failed(format!("Weather service returned HTTP {status}")),
        404 => CapabilityError::InvalidResponse("unknown location".to_string()),
        _ => CapabilityError::InvalidResponse(format!("HTTP {status}")),
    }
}

#[derive(Debug, Deserialize)]
struct WttrResponse {
    current_condition: Vec<WttrCondition>,
}

#[derive(Debug, Deserialize)]
struct WttrCondition {
    #[serde(rename = "temp_F")]
    temp_f: String,
    #[serde(rename = "weatherDesc", default)]
    weather_desc: Vec<WttrValue>,
}

#[derive(Debug, Deserialize)]
struct WttrValue {
    value: String,
}

/// Extract the current condition from a `format=j1` body.
fn parse_report(body: &str) -> Result<WeatherReport> {
    let response: WttrResponse = serde_json::from_str(body)
        .map_err(|e| CapabilityError::InvalidResponse(format!("Failed to parse weather: {e}")))?;

    let current = response
        .current_condition
        .into_iter()
        .next()
        .ok_or_else(|| CapabilityError::InvalidResponse("no current condition".to_string()))?;

    let temp_f = current.temp_f.trim().parse::<i32>().map_err(|_| {
        CapabilityError::InvalidResponse(format!("bad temperature '{}'", current.temp_f))
    })?;

    let condition = current
        .weather_desc
        .into_iter()
        .map(|d| d.value.trim().to_string())
        .find(|d| !d.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(WeatherReport { condition, temp_f })
}

//! Application settings configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};
use crate::commands::{DuplicatePolicy, Intent, Matcher};

/// Maximum allowed retries for a transient capability failure.
pub const MAX_CAPABILITY_RETRIES: u32 = 3;

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Command files merged in order. Empty means the built-in table.
    pub command_files: Vec<PathBuf>,
    /// How duplicate inputs across command files are reconciled.
    pub duplicate_policy: DuplicatePolicy,
    /// Minimum similarity for a fuzzy match, in (0, 1].
    pub match_threshold: f64,
    /// Timeout for a single capability call in milliseconds.
    pub capability_timeout_ms: u64,
    /// Retries after a transient capability failure.
    pub capability_retries: u32,
    /// Weather service, if any.
    pub weather: Option<WeatherSettings>,
    /// Replies used when a capability cannot answer.
    pub fallbacks: Fallbacks,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            command_files: Vec::new(),
            duplicate_policy: DuplicatePolicy::default(),
            match_threshold: Matcher::DEFAULT_THRESHOLD,
            capability_timeout_ms: 2000,
            capability_retries: 1,
            weather: None,
            fallbacks: Fallbacks::default(),
        }
    }
}

impl Settings {
    /// Validate these settings.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` with details if validation fails.
    pub fn validate(&self) -> Result<()> {
        if !(self.match_threshold > 0.0 && self.match_threshold <= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "match_threshold must be in (0, 1], got {}",
                self.match_threshold
            )));
        }

        if self.capability_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "capability_timeout_ms must be greater than zero".to_string(),
            ));
        }

        if self.capability_retries > MAX_CAPABILITY_RETRIES {
            return Err(ConfigError::ValidationError(format!(
                "capability_retries must be at most {}, got {}",
                MAX_CAPABILITY_RETRIES, self.capability_retries
            )));
        }

        if let Some(weather) = &self.weather {
            weather.validate()?;
        }

        Ok(())
    }

    /// Timeout for a single capability call.
    pub fn capability_timeout(&self) -> Duration {
        Duration::from_millis(self.capability_timeout_ms)
    }
}

/// Weather service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSettings {
    /// City name or coordinates understood by the service.
    pub location: String,
    /// Service base URL.
    #[serde(default = "default_weather_url")]
    pub base_url: String,
}

fn default_weather_url() -> String {
    "https://wttr.in".to_string()
}

impl WeatherSettings {
    fn validate(&self) -> Result<()> {
        if self.location.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "weather location cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(ConfigError::ValidationError(format!(
                "weather base_url '{}' must start with http:// or https://",
                self.base_url
            )));
        }

        Ok(())
    }
}

/// Replies used when a command cannot be answered normally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fallbacks {
    pub time: String,
    pub weather: String,
    pub lighting: String,
    pub media: String,
    /// Reply for input that matched nothing.
    pub no_match: String,
}

impl Default for Fallbacks {
    fn default() -> Self {
        Self {
            time: "I can't read the clock right now.".to_string(),
            weather: "Weather information is unavailable right now. Please try again later."
                .to_string(),
            lighting: "I couldn't reach the lighting system. Please try again.".to_string(),
            media: "I couldn't reach the music player. Please try again.".to_string(),
            no_match: "Sorry, I didn't understand that. Say \"help\" to see what I can do."
                .to_string(),
        }
    }
}

impl Fallbacks {
    /// The fallback reply for a dynamic intent.
    pub fn for_intent(&self, intent: &Intent) -> &str {
        match intent {
            Intent::Clock => &self.time,
            Intent::Weather => &self.weather,
            Intent::Lighting(_) => &self.lighting,
            Intent::Media(_) => &self.media,
            Intent::Static => &self.no_match,
        }
    }
}

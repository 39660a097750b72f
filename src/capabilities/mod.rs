//! External capabilities the dispatcher delegates to.
//!
//! The core only sees these traits. Concrete implementations are plugged
//! into a [`CapabilitySet`]; any capability may be absent, in which case the
//! dispatcher answers with fallback text.

mod clock;
mod weather;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::commands::MediaAction;

pub use clock::SystemClock;
pub use weather::WttrWeather;

/// Errors reported by capabilities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CapabilityError {
    /// The capability is not configured or cannot be reached.
    #[error("{0} is unavailable")]
    Unavailable(String),

    /// The call did not complete within the dispatch timeout.
    #[error("{capability} did not respond within {timeout_ms}ms")]
    Timeout {
        capability: &'static str,
        timeout_ms: u64,
    },

    /// A failure worth one more attempt (busy service, dropped request).
    #[error("{0}")]
    Failed(String),

    /// The capability answered with something unusable.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CapabilityError {
    /// Whether a single retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CapabilityError::Failed(_))
    }
}

/// Result type for capability calls.
pub type Result<T> = std::result::Result<T, CapabilityError>;

/// Current weather conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Short description, e.g. "Sunny".
    pub condition: String,
    /// Temperature in degrees Fahrenheit.
    pub temp_f: i32,
}

/// Source of the current local time.
pub trait ClockCapability: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Source of current weather conditions.
#[async_trait]
pub trait WeatherCapability: Send + Sync {
    async fn current(&self) -> Result<WeatherReport>;
}

/// Smart lighting controller.
#[async_trait]
pub trait LightingCapability: Send + Sync {
    /// Switch the lights, with brightness in `0..=100`.
    async fn set_state(&self, on: bool, brightness: u8) -> Result<()>;
}

/// Media player.
#[async_trait]
pub trait MediaCapability: Send + Sync {
    async fn control(&self, action: MediaAction) -> Result<()>;
}

/// The capabilities available to the dispatcher.
#[derive(Clone, Default)]
pub struct CapabilitySet {
    pub clock: Option<Arc<dyn ClockCapability>>,
    pub weather: Option<Arc<dyn WeatherCapability>>,
    pub lighting: Option<Arc<dyn LightingCapability>>,
    pub media: Option<Arc<dyn MediaCapability>>,
}

impl CapabilitySet {
    /// An empty set; every dynamic command falls back.
    pub fn new() -> Self {
        Self::default()
    }

    /// A set with the system clock installed.
    pub fn system() -> Self {
        Self::new().with_clock(SystemClock)
    }

    pub fn with_clock(mut self, clock: impl ClockCapability + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn with_weather(mut self, weather: impl WeatherCapability + 'static) -> Self {
        self.weather = Some(Arc::new(weather));
        self
    }

    pub fn with_lighting(mut self, lighting: impl LightingCapability + 'static) -> Self {
        self.lighting = Some(Arc::new(lighting));
        self
    }

    pub fn with_media(mut self, media: impl MediaCapability + 'static) -> Self {
        self.media = Some(Arc::new(media));
        self
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilitySet")
            .field("clock", &self.clock.is_some())
            .field("weather", &self.weather.is_some())
            .field("lighting", &self.lighting.is_some())
            .field("media", &self.media.is_some())
            .finish()
    }
}

//! Turning matched commands into replies.
//!
//! The dispatcher routes on the intent fixed at table-load time. Static
//! entries are returned verbatim; dynamic ones call a capability under a
//! timeout. A capability that is missing, fails, or times out produces the
//! configured fallback reply, never an error.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, instrument, warn};

use crate::capabilities::{CapabilityError, CapabilitySet, WeatherReport};
use crate::commands::{CommandCategory, CommandEntry, Intent};
use crate::config::{Fallbacks, Settings};

/// Default timeout for one capability call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Reply used for clock entries without placeholders.
const DEFAULT_CLOCK_TEMPLATE: &str = "It's {time}.";

/// Reply used for weather entries without placeholders.
const DEFAULT_WEATHER_TEMPLATE: &str = "Weather: {condition}, {temp_f}°F.";

/// How a reply was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Template returned verbatim.
    Static,
    /// A capability answered.
    Capability,
    /// A capability could not answer; fallback text was used.
    Fallback,
    /// Nothing matched the input.
    NoMatch,
}

/// The user-facing reply to one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Text to show or speak.
    pub text: String,
    pub kind: ResponseKind,
    /// Category of the matched command, if any.
    pub category: Option<CommandCategory>,
    /// Match confidence in `0.0..=1.0`.
    pub confidence: f64,
}

impl Response {
    fn for_entry(entry: &CommandEntry, text: String, kind: ResponseKind) -> Self {
        Self {
            text,
            kind,
            category: Some(entry.category),
            confidence: 1.0,
        }
    }

    /// A reply for input that matched nothing.
    pub fn no_match(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            kind: ResponseKind::NoMatch,
            category: None,
            confidence,
        }
    }

    /// Whether the conversation should end after this reply.
    pub fn ends_session(&self) -> bool {
        self.category == Some(CommandCategory::Farewell)
    }

    /// Whether a capability failure was papered over.
    pub fn is_fallback(&self) -> bool {
        self.kind == ResponseKind::Fallback
    }
}

/// Routes matched entries to static text or capabilities.
///
/// Holds no per-conversation state; cloning is cheap.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    capabilities: CapabilitySet,
    fallbacks: Fallbacks,
    /// Timeout for one capability call.
    timeout: Duration,
    /// Extra attempts after a transient failure.
    retries: u32,
}

impl Dispatcher {
    /// Create a dispatcher with default timeout and a single retry.
    pub fn new(capabilities: CapabilitySet, fallbacks: Fallbacks) -> Self {
        Self {
            capabilities,
            fallbacks,
            timeout: DEFAULT_TIMEOUT,
            retries: 1,
        }
    }

    /// Create a dispatcher from settings.
    pub fn from_settings(capabilities: CapabilitySet, settings: &Settings) -> Self {
        Self::new(capabilities, settings.fallbacks.clone())
            .with_timeout(settings.capability_timeout())
            .with_retries(settings.capability_retries)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn fallbacks(&self) -> &Fallbacks {
        &self.fallbacks
    }

    /// Produce the reply for a matched entry.
    #[instrument(skip(self, entry), fields(input = %entry.input, intent = ?entry.intent))]
    pub async fn dispatch(&self, entry: &CommandEntry) -> Response {
        let outcome = match entry.intent {
            Intent::Static => {
                return Response::for_entry(entry, entry.output.clone(), ResponseKind::Static)
            }
            Intent::Clock => self.tell_time(entry),
            Intent::Weather => self.tell_weather(entry).await,
            Intent::Lighting(request) => match &self.capabilities.lighting {
                Some(lighting) => self
                    .call("lighting", || lighting.set_state(request.on, request.brightness))
                    .await
                    .map(|()| entry.output.clone()),
                None => Err(CapabilityError::Unavailable("lighting".to_string())),
            },
            Intent::Media(action) => match &self.capabilities.media {
                Some(media) => self
                    .call("media", || media.control(action))
                    .await
                    .map(|()| entry.output.clone()),
                None => Err(CapabilityError::Unavailable("media".to_string())),
            },
        };

        match outcome {
            Ok(text) => Response::for_entry(entry, text, ResponseKind::Capability),
            Err(e) => {
                warn!(error = %e, "Capability failed, using fallback");
                let text = self.fallbacks.for_intent(&entry.intent).to_string();
                Response::for_entry(entry, text, ResponseKind::Fallback)
            }
        }
    }

    fn tell_time(&self, entry: &CommandEntry) -> Result<String, CapabilityError> {
        let clock = self
            .capabilities
            .clock
            .as_ref()
            .ok_or_else(|| CapabilityError::Unavailable("clock".to_string()))?;
        Ok(render_time(&entry.output, clock.now()))
    }

    async fn tell_weather(&self, entry: &CommandEntry) -> Result<String, CapabilityError> {
        let weather = self
            .capabilities
            .weather
            .as_ref()
            .ok_or_else(|| CapabilityError::Unavailable("weather".to_string()))?;
        let report = self.call("weather", || weather.current()).await?;
        Ok(render_weather(&entry.output, &report))
    }

    /// Run a capability call under the timeout, retrying transient failures.
    ///
    /// Timeouts are not retried.
    async fn call<T, F, Fut>(&self, capability: &'static str, mut op: F) -> Result<T, CapabilityError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CapabilityError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match tokio::time::timeout(self.timeout, op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) if e.is_transient() && attempt <= self.retries => {
                    debug!(capability, attempt, error = %e, "Transient failure, retrying");
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    return Err(CapabilityError::Timeout {
                        capability,
                        timeout_ms: self.timeout.as_millis() as u64,
                    })
                }
            }
        }
    }
}

/// Fill `{time}` and `{date}`.
fn render_time(template: &str, now: DateTime<Local>) -> String {
    let template = if has_placeholder(template, &["time", "date"]) {
        template
    } else {
        DEFAULT_CLOCK_TEMPLATE
    };
    fill(
        template,
        &[
            ("time", now.format("%-I:%M %p").to_string()),
            ("date", now.format("%A, %B %-d").to_string()),
        ],
    )
}

/// Fill `{condition}` and `{temp_f}`.
fn render_weather(template: &str, report: &WeatherReport) -> String {
    let template = if has_placeholder(template, &["condition", "temp_f"]) {
        template
    } else {
        DEFAULT_WEATHER_TEMPLATE
    };
    fill(
        template,
        &[
            ("condition", report.condition.clone()),
            ("temp_f", report.temp_f.to_string()),
        ],
    )
}

fn has_placeholder(template: &str, keys: &[&str]) -> bool {
    keys.iter().any(|key| template.contains(&format!("{{{key}}}")))
}

fn fill(template: &str, values: &[(&str, String)]) -> String {
    values.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{key}}}"), value)
    })
}

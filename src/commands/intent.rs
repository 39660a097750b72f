//! Command categories and routing intents.
//!
//! Every table entry is classified exactly once, when the table is loaded.
//! The dispatcher routes on the resulting [`Intent`] and never inspects the
//! phrase text again.

use serde::{Deserialize, Serialize};

/// Categories for organizing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandCategory {
    /// Small talk with no better home.
    General,
    /// Greetings.
    Greeting,
    /// Clock and date queries.
    Time,
    /// Weather queries.
    Weather,
    /// Smart lighting control.
    Lighting,
    /// Music playback control.
    Media,
    /// Help and capability listing.
    Help,
    /// Hub status and diagnostics.
    System,
    /// Ends the session.
    Farewell,
}

impl CommandCategory {
    /// All categories, in display order.
    pub const ALL: [CommandCategory; 9] = [
        Self::Greeting,
        Self::Time,
        Self::Weather,
        Self::Lighting,
        Self::Media,
        Self::Help,
        Self::System,
        Self::General,
        Self::Farewell,
    ];

    /// Get the display name for this category.
    pub fn display(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Greeting => "Greeting",
            Self::Time => "Time",
            Self::Weather => "Weather",
            Self::Lighting => "Lighting",
            Self::Media => "Media",
            Self::Help => "Help",
            Self::System => "System",
            Self::Farewell => "Farewell",
        }
    }

    /// Derive a category from a normalized input phrase.
    ///
    /// Checks run in a fixed order so that phrases touching several
    /// keyword sets ("weather forecast time") resolve deterministically.
    pub fn classify(normalized: &str) -> Self {
        let words: Vec<&str> = normalized
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
            .collect();
        let has = |candidates: &[&str]| words.iter().any(|w| candidates.contains(w));

        if has(&["goodbye", "bye", "exit", "quit"]) {
            Self::Farewell
        } else if has(&["weather", "temperature", "forecast"]) {
            Self::Weather
        } else if has(&["time", "clock"]) {
            Self::Time
        } else if has(&["light", "lights", "lamp", "lamps"]) {
            Self::Lighting
        } else if has(&["music", "song", "track", "volume", "playlist"]) {
            Self::Media
        } else if has(&["help"]) || normalized == "what can you do" {
            Self::Help
        } else if has(&["status", "system", "debug", "diagnostics"]) {
            Self::System
        } else if has(&["hello", "hi", "hey", "greetings"]) {
            Self::Greeting
        } else {
            Self::General
        }
    }
}

/// Playback actions understood by a media capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaAction {
    Play,
    Pause,
    Next,
    VolumeUp,
    VolumeDown,
}

/// Requested state for a lighting capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightingRequest {
    /// Whether the lights should be on.
    pub on: bool,
    /// Brightness percentage, 0..=100.
    pub brightness: u8,
}

impl LightingRequest {
    /// Brightness used by "dim" commands.
    pub const DIM_BRIGHTNESS: u8 = 50;

    pub fn on(brightness: u8) -> Self {
        Self {
            on: true,
            brightness: brightness.min(100),
        }
    }

    pub fn off() -> Self {
        Self {
            on: false,
            brightness: 0,
        }
    }
}

/// How a matched entry is turned into a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Return the template verbatim.
    Static,
    /// Fill the template from the clock.
    Clock,
    /// Fill the template from the weather service.
    Weather,
    /// Change the lighting state, then return the template.
    Lighting(LightingRequest),
    /// Send a playback action, then return the template.
    Media(MediaAction),
}

impl Intent {
    /// Resolve the routing intent for an entry.
    ///
    /// Informational phrases inside an actionable category ("lights",
    /// "music") stay static.
    pub fn resolve(category: CommandCategory, normalized: &str) -> Self {
        let words: Vec<&str> = normalized.split_whitespace().collect();
        let has = |candidates: &[&str]| words.iter().any(|w| candidates.contains(w));

        match category {
            CommandCategory::Time => Intent::Clock,
            CommandCategory::Weather => Intent::Weather,
            CommandCategory::Lighting => {
                if has(&["off"]) {
                    Intent::Lighting(LightingRequest::off())
                } else if has(&["dim", "dimmer"]) {
                    Intent::Lighting(LightingRequest::on(LightingRequest::DIM_BRIGHTNESS))
                } else if has(&["bright", "brighten", "max", "on"]) {
                    Intent::Lighting(LightingRequest::on(100))
                } else {
                    Intent::Static
                }
            }
            CommandCategory::Media => {
                if has(&["pause", "stop"]) {
                    Intent::Media(MediaAction::Pause)
                } else if has(&["next", "skip"]) {
                    Intent::Media(MediaAction::Next)
                } else if has(&["volume", "louder", "quieter"]) {
                    if has(&["down", "quieter", "lower"]) {
                        Intent::Media(MediaAction::VolumeDown)
                    } else {
                        Intent::Media(MediaAction::VolumeUp)
                    }
                } else if has(&["play", "resume", "start"]) {
                    Intent::Media(MediaAction::Play)
                } else {
                    Intent::Static
                }
            }
            _ => Intent::Static,
        }
    }

    /// Whether dispatching this intent calls out to a capability.
    pub fn is_dynamic(&self) -> bool {
        !matches!(self, Intent::Static)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_builtin_phrases() {
        assert_eq!(CommandCategory::classify("hello"), CommandCategory::Greeting);
        assert_eq!(CommandCategory::classify("what time is it"), CommandCategory::Time);
        assert_eq!(CommandCategory::classify("clock"), CommandCategory::Time);
        assert_eq!(
            CommandCategory::classify("what's the weather"),
            CommandCategory::Weather
        );
        assert_eq!(CommandCategory::classify("temperature"), CommandCategory::Weather);
        assert_eq!(CommandCategory::classify("dim lights"), CommandCategory::Lighting);
        assert_eq!(CommandCategory::classify("next song"), CommandCategory::Media);
        assert_eq!(CommandCategory::classify("volume up"), CommandCategory::Media);
        assert_eq!(CommandCategory::classify("what can you do"), CommandCategory::Help);
        assert_eq!(CommandCategory::classify("system info"), CommandCategory::System);
        assert_eq!(CommandCategory::classify("exit"), CommandCategory::Farewell);
        assert_eq!(CommandCategory::classify("thank you"), CommandCategory::General);
    }

    #[test]
    fn test_classify_ignores_punctuation() {
        assert_eq!(CommandCategory::classify("bye!"), CommandCategory::Farewell);
        assert_eq!(CommandCategory::classify("time?"), CommandCategory::Time);
    }

    #[test]
    fn test_resolve_lighting() {
        assert_eq!(
            Intent::resolve(CommandCategory::Lighting, "turn on lights"),
            Intent::Lighting(LightingRequest::on(100))
        );
        assert_eq!(
            Intent::resolve(CommandCategory::Lighting, "turn off lights"),
            Intent::Lighting(LightingRequest::off())
        );
        assert_eq!(
            Intent::resolve(CommandCategory::Lighting, "dim lights"),
            Intent::Lighting(LightingRequest::on(50))
        );
        assert_eq!(
            Intent::resolve(CommandCategory::Lighting, "lights"),
            Intent::Static
        );
    }

    #[test]
    fn test_resolve_media() {
        assert_eq!(
            Intent::resolve(CommandCategory::Media, "play music"),
            Intent::Media(MediaAction::Play)
        );
        assert_eq!(
            Intent::resolve(CommandCategory::Media, "pause music"),
            Intent::Media(MediaAction::Pause)
        );
        assert_eq!(
            Intent::resolve(CommandCategory::Media, "volume down"),
            Intent::Media(MediaAction::VolumeDown)
        );
        assert_eq!(Intent::resolve(CommandCategory::Media, "music"), Intent::Static);
    }

    #[test]
    fn test_static_categories_are_not_dynamic() {
        assert!(!Intent::resolve(CommandCategory::Greeting, "hello").is_dynamic());
        assert!(Intent::resolve(CommandCategory::Time, "time").is_dynamic());
    }

    #[test]
    fn test_category_serde_lowercase() {
        let category: CommandCategory = serde_json::from_str("\"weather\"").unwrap();
        assert_eq!(category, CommandCategory::Weather);
        assert_eq!(
            serde_json::to_string(&CommandCategory::Farewell).unwrap(),
            "\"farewell\""
        );
    }

    #[test]
    fn test_lighting_request_clamps_brightness() {
        assert_eq!(LightingRequest::on(250).brightness, 100);
    }
}

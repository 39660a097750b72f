//! ARC Assistant - command matching and response dispatch for the ARC Hub.
//!
//! Utterances are matched against a table of canned commands, first exactly
//! and then fuzzily, and the matched command is answered either with static
//! text or by calling out to an external capability (clock, weather,
//! lighting, media).

pub mod assistant;
pub mod capabilities;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod tasks;

pub use assistant::Assistant;
pub use dispatch::{Response, ResponseKind};
pub use error::{AppError, Result};

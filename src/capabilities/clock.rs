//! Local system clock.

use chrono::{DateTime, Local};

use super::ClockCapability;

/// Reads the host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockCapability for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

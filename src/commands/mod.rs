//! Command table and matching.
//!
//! This module provides:
//! - Input normalization shared by table construction and matching
//! - The command table, loaded once and installed process-wide
//! - Categories and routing intents assigned at load time
//! - Exact-then-fuzzy matching with suggestions

mod intent;
mod matcher;
mod table;

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::info;

pub use intent::{CommandCategory, Intent, LightingRequest, MediaAction};
pub use matcher::{MatchKind, MatchResult, Matcher, Suggestion};
pub use table::{CommandEntry, CommandTable, DuplicatePolicy, Result, TableError};

/// The process-wide command table.
static INSTALLED: OnceCell<Arc<CommandTable>> = OnceCell::new();

/// Normalize raw text for comparison.
///
/// Trims, lowercases and collapses internal whitespace runs to a single
/// space. Applying it twice gives the same result as applying it once.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Install the process-wide command table.
///
/// May be called once per process; later calls fail with
/// [`TableError::AlreadyInstalled`] and leave the first table in place.
pub fn install(table: CommandTable) -> Result<Arc<CommandTable>> {
    let table = Arc::new(table);
    INSTALLED
        .set(Arc::clone(&table))
        .map_err(|_| TableError::AlreadyInstalled)?;
    info!(entries = table.len(), "Command table installed");
    Ok(table)
}

/// The process-wide command table, if one was installed.
pub fn installed() -> Option<Arc<CommandTable>> {
    INSTALLED.get().cloned()
}

//! Centralized error types for the ARC Assistant.
//!
//! Only startup can fail: a bad configuration or command table stops the
//! process. Everything after that (unmatched input, capability failures)
//! is answered with a normal reply and never surfaces here.

use thiserror::Error;

use crate::commands::TableError;
use crate::config::ConfigError;

/// The main application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Command table errors.
    #[error("{0}")]
    Table(#[from] TableError),

    /// IO errors (terminal input, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with a message.
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Create a generic error.
    pub fn other(msg: impl Into<String>) -> Self {
        AppError::Other(msg.into())
    }

    /// Get a user-friendly message for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not find configuration directory. Please check your system settings."
                        .to_string()
                }
                ConfigError::ReadError(_) => {
                    "Could not read configuration file. Please check the file is readable."
                        .to_string()
                }
                ConfigError::ParseError(_) => {
                    "Configuration file is invalid. Please check the file format.".to_string()
                }
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
            },
            AppError::Table(e) => match e {
                TableError::Parse { document, .. } => {
                    format!("Command file #{} is not a valid command list.", document + 1)
                }
                TableError::EmptyInput { document, index } => format!(
                    "Command #{} in command file #{} has no input phrase.",
                    index + 1,
                    document + 1
                ),
                TableError::DuplicateEntry { input, .. } => {
                    format!("The phrase '{}' is defined more than once.", input)
                }
                TableError::Io { path, .. } => {
                    format!("Could not read command file {}.", path.display())
                }
                TableError::AlreadyInstalled => {
                    "The command table was loaded twice. This is a bug.".to_string()
                }
            },
            AppError::Io(_) => "An input/output operation failed.".to_string(),
            AppError::Other(msg) => msg.clone(),
        }
    }

    /// Check if this error prevents the assistant from starting.
    pub fn is_critical(&self) -> bool {
        matches!(self, AppError::Config(_) | AppError::Table(_))
    }

    /// Get a suggested action for the user.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Table(TableError::DuplicateEntry { .. }) => Some(
                "Remove one of the entries, or set duplicate_policy = \"last-write-wins\" in config.toml.",
            ),
            AppError::Table(TableError::Parse { .. }) => {
                Some("Each command must be an object with \"input\" and \"output\" strings.")
            }
            AppError::Config(ConfigError::ParseError(_))
            | AppError::Config(ConfigError::ValidationError(_)) => {
                Some("Fix config.toml or point ARC_ASSISTANT_CONFIG at another file.")
            }
            _ => None,
        }
    }
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;

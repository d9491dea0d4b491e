//! Error types for rmk-debounce-config

use std::fmt;

/// Error raised while reading the `[debounce]` section of `keyboard.toml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// TOML parsing error
    TomlParse { message: String },
    /// Invalid value
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TomlParse { message } => {
                write!(f, "Failed to parse `keyboard.toml`: {}", message)
            }
            ConfigError::InvalidValue { field, value, expected } => {
                write!(f, "Invalid value '{}' for '{}', expected {}", value, field, expected)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Result alias for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

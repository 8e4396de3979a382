//! Configuration error types

use thiserror::Error;

/// Errors raised while assembling a [`ConnectionTable`](crate::ConnectionTable)
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The layered file/environment source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    /// A required environment variable is not set
    #[error("Missing environment variable: {0}")]
    MissingVar(String),

    /// An environment variable is set but cannot be parsed
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

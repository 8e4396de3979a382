//! Shared configuration for the connreg workspace
//!
//! This crate holds the types every other crate agrees on:
//! - Per-connection MySQL settings and their connection string
//! - The named connection table handed to the registry
//! - Environment detection and logging configuration
//! - Configuration loading errors

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use crate::config::{
    ConnectionTable, Environment, LogFormat, LoggingConfig, MySqlConfig, DEFAULT_CONNECTION_NAME,
};
pub use crate::errors::ConfigError;

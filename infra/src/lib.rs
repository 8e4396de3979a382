//! # Infrastructure Layer
//!
//! Concrete implementations behind the `cr_core` registry:
//! - **Database**: the SQLx MySQL [`Connector`](cr_core::Connector) and its pool handle
//! - **Telemetry**: tracing subscriber installation
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)

use std::time::Duration;

pub use cr_core::{CloseReport, ConnectionRegistry, RegistryError};
pub use cr_shared::{ConnectionTable, LoggingConfig, MySqlConfig};

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Tracing subscriber setup
pub mod telemetry;

#[cfg(feature = "mysql")]
pub use database::{DatabasePool, MySqlConnector, MySqlRegistry, PoolStatistics};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Closing a pool did not finish in time
    #[error("Timed out after {timeout:?} closing connection pool {name}")]
    CloseTimeout { name: String, timeout: Duration },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

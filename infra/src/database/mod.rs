//! Database module - MySQL implementations using SQLx
//!
//! - Connection pool handle with health checks and statistics
//! - The [`Connector`](cr_core::Connector) the registry opens pools through

pub mod connection;
pub mod connector;


// Re-export commonly used types
pub use connection::{DatabasePool, PoolStatistics};
pub use connector::{MySqlConnector, MySqlRegistry};

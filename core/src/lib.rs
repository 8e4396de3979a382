//! # Connreg Core
//!
//! The connection registry and the [`Connector`] trait it opens connections
//! through. Driver implementations live in `cr_infra`; configuration types
//! come from `cr_shared`.

pub mod connector;
pub mod errors;
pub mod registry;

// Re-export commonly used types for convenience
pub use connector::Connector;
pub use errors::{BoxError, RegistryError, SharedError};
pub use registry::{CloseFailure, CloseReport, ConnectionRegistry};

pub use cr_shared::{ConnectionTable, MySqlConfig};

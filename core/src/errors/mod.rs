//! Registry error types

use std::sync::Arc;
use thiserror::Error;

/// Type-erased driver error
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Driver error shared by every caller that waited on the same failed open
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`ConnectionRegistry`](crate::ConnectionRegistry)
#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    /// The requested name has no entry in the connection table
    #[error("Can't read mysql config: {name}")]
    Configuration { name: String },

    /// The driver failed to open the connection
    ///
    /// `target` is the redacted connection string.
    #[error("Connect mysql ({name}: {target}) failed: {source}")]
    Connection {
        name: String,
        target: String,
        #[source]
        source: SharedError,
    },
}

impl RegistryError {
    /// Name of the connection the error refers to
    pub fn name(&self) -> &str {
        match self {
            RegistryError::Configuration { name } | RegistryError::Connection { name, .. } => name,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, RegistryError::Configuration { .. })
    }
}

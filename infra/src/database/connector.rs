//! SQLx implementation of the registry's driver seam.

use async_trait::async_trait;
use std::time::Duration;

use cr_core::{ConnectionRegistry, Connector};

use super::connection::DatabasePool;
use crate::{ConnectionTable, InfrastructureError, MySqlConfig};

/// How long [`MySqlConnector::close`] waits for a pool to drain by default
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Registry of named SQLx MySQL pools
pub type MySqlRegistry = ConnectionRegistry<MySqlConnector>;

/// Opens [`DatabasePool`]s for the connection registry
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    close_timeout: Duration,
}

impl Default for MySqlConnector {
    fn default() -> Self {
        Self {
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }
}

impl MySqlConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound how long closing a pool may wait for checked-out connections
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn close_timeout(&self) -> Duration {
        self.close_timeout
    }

    /// Registry over `table` backed by this connector
    pub fn into_registry(self, table: ConnectionTable) -> MySqlRegistry {
        ConnectionRegistry::new(self, table)
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    type Handle = DatabasePool;
    type Error = InfrastructureError;

    async fn open(&self, name: &str, config: &MySqlConfig) -> Result<DatabasePool, InfrastructureError> {
        DatabasePool::connect(name, config).await
    }

    async fn close(&self, handle: &DatabasePool) -> Result<(), InfrastructureError> {
        tokio::time::timeout(self.close_timeout, handle.close())
            .await
            .map_err(|_| {
                tracing::warn!(
                    connection = handle.name(),
                    "Connection pool still had checked-out connections after {:?}",
                    self.close_timeout
                );
                InfrastructureError::CloseTimeout {
                    name: handle.name().to_string(),
                    timeout: self.close_timeout,
                }
            })
    }
}

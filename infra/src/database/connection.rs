//! Database connection pool management
//!
//! [`DatabasePool`] is the handle the registry caches for each named
//! connection. It wraps a SQLx MySQL pool built from a [`MySqlConfig`].

use sqlx::{
    mysql::{MySqlConnectOptions, MySqlPoolOptions},
    ConnectOptions, MySqlPool,
};
use std::sync::Arc;
use tracing::log::LevelFilter;

use crate::{InfrastructureError, MySqlConfig};

/// Named MySQL connection pool
///
/// Clones share the same underlying pool.
#[derive(Clone, Debug)]
pub struct DatabasePool {
    /// Registry name of this connection
    name: Arc<str>,
    /// SQLx MySQL connection pool
    pool: MySqlPool,
}

impl DatabasePool {
    /// Open a pool for the connection `name`
    ///
    /// At least one connection is established before returning, so an
    /// unreachable server or bad credentials surface here.
    ///
    /// # Example
    /// ```no_run
    /// use cr_infra::{DatabasePool, MySqlConfig};
    ///
    /// async fn open() -> Result<DatabasePool, cr_infra::InfrastructureError> {
    ///     let config = MySqlConfig::new("127.0.0.1", 3306, "root", "x", "test");
    ///     DatabasePool::connect("default", &config).await
    /// }
    /// ```
    pub async fn connect(name: &str, config: &MySqlConfig) -> Result<Self, InfrastructureError> {
        tracing::info!(
            connection = name,
            max_connections = config.max_connections(),
            "Creating database connection pool"
        );

        let pool = pool_options(config)
            .connect_with(connect_options(config))
            .await
            .map_err(|e| {
                tracing::error!(connection = name, "Failed to create database pool: {}", e);
                InfrastructureError::Database(e)
            })?;

        tracing::info!(connection = name, "Database connection pool created");

        Ok(Self {
            name: Arc::from(name),
            pool,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a reference to the underlying SQLx pool
    ///
    /// Use this for executing queries and transactions.
    pub fn get_pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Check if the database connection is healthy
    ///
    /// Runs `SELECT 1` and verifies the result.
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        tracing::debug!(connection = %self.name, "Performing database health check");

        let value: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(connection = %self.name, "Database health check failed: {}", e);
                InfrastructureError::Database(e)
            })?;

        if value == 1 {
            Ok(true)
        } else {
            tracing::warn!(connection = %self.name, "Database health check returned unexpected value: {}", value);
            Ok(false)
        }
    }

    /// Get connection pool statistics
    pub fn get_statistics(&self) -> PoolStatistics {
        PoolStatistics {
            connections: self.pool.size(),
            idle_connections: self.pool.num_idle(),
            max_connections: self.pool.options().get_max_connections(),
        }
    }

    /// Begin a new database transaction
    pub async fn begin_transaction(
        &self,
    ) -> Result<sqlx::Transaction<'static, sqlx::MySql>, InfrastructureError> {
        Ok(self.pool.begin().await?)
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Close all connections in the pool
    ///
    /// Waits for checked-out connections to be returned.
    pub async fn close(&self) {
        tracing::info!(connection = %self.name, "Closing database connection pool");
        self.pool.close().await;
    }
}

/// Connect options from the configured server, credentials and charset
pub(crate) fn connect_options(config: &MySqlConfig) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .charset(config.charset());

    if !config.password.is_empty() {
        options = options.password(&config.password);
    }
    if !config.database.is_empty() {
        options = options.database(&config.database);
    }

    if config.log_mode {
        options
            .log_statements(LevelFilter::Info)
            .log_slow_statements(LevelFilter::Warn, config.slow_threshold())
    } else {
        options.disable_statement_logging()
    }
}

/// Pool sizing and lifetimes; `timeout` bounds how long opening a connection may take
pub(crate) fn pool_options(config: &MySqlConfig) -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(config.max_connections())
        .min_connections(1)
        .acquire_timeout(config.timeout())
        .max_lifetime(config.max_lifetime())
}

/// Connection pool statistics
#[derive(Debug, Clone)]
pub struct PoolStatistics {
    /// Total number of connections in the pool
    pub connections: u32,
    /// Number of idle connections
    pub idle_connections: usize,
    /// Maximum allowed connections
    pub max_connections: u32,
}

impl std::fmt::Display for PoolStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pool Stats: {}/{} connections ({} idle)",
            self.connections, self.max_connections, self.idle_connections
        )
    }
}

//! Driver seam used by the registry to open and close connections.

use async_trait::async_trait;

use crate::MySqlConfig;

/// Opens and closes pooled database handles
///
/// The registry calls [`open`](Connector::open) at most once per name until
/// the name is evicted, and [`close`](Connector::close) once per cached
/// handle during shutdown.
///
/// # Example Implementation
/// ```no_run
/// use async_trait::async_trait;
/// use cr_core::{Connector, MySqlConfig};
///
/// struct NullConnector;
///
/// #[async_trait]
/// impl Connector for NullConnector {
///     type Handle = String;
///     type Error = std::io::Error;
///
///     async fn open(&self, name: &str, _config: &MySqlConfig) -> Result<String, Self::Error> {
///         Ok(name.to_string())
///     }
///
///     async fn close(&self, _handle: &String) -> Result<(), Self::Error> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connection handle returned to callers; clones share the same pool
    type Handle: Clone + Send + Sync + 'static;

    /// Driver error
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open a new handle for the connection `name`
    async fn open(&self, name: &str, config: &MySqlConfig) -> Result<Self::Handle, Self::Error>;

    /// Close a handle previously returned by `open`
    async fn close(&self, handle: &Self::Handle) -> Result<(), Self::Error>;
}

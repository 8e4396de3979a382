//! Named connection registry
//!
//! [`ConnectionRegistry`] opens a connection the first time its name is
//! requested and hands out clones of the cached handle afterwards. Each name
//! owns an entry whose async lock is held for the whole open, so
//! concurrent first callers share one open and all see its outcome. Callers
//! that arrive after a failed open start a new one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Mutex as AsyncMutex;

use crate::connector::Connector;
use crate::errors::{BoxError, RegistryError};
use crate::ConnectionTable;

#[cfg(test)]
mod tests;

/// Per-name cache entry
struct Entry<H> {
    state: AsyncMutex<EntryState<H>>,
    /// Set while `state.handle` holds an open handle
    open: AtomicBool,
    /// Number of completed failed opens
    failures: AtomicU64,
}

struct EntryState<H> {
    handle: Option<H>,
    last_error: Option<RegistryError>,
    /// Removed from the cache by `close_all`; callers holding it must look up a fresh entry
    evicted: bool,
}

impl<H> Default for Entry<H> {
    fn default() -> Self {
        Self {
            state: AsyncMutex::new(EntryState {
                handle: None,
                last_error: None,
                evicted: false,
            }),
            open: AtomicBool::new(false),
            failures: AtomicU64::new(0),
        }
    }
}

/// Lazily opened, cached connections keyed by name
///
/// Construct one registry at startup and share it (typically behind an
/// [`Arc`]) with everything that needs a database handle.
///
/// # Example
/// ```no_run
/// # use cr_core::{ConnectionRegistry, Connector, RegistryError};
/// # async fn run<C: Connector>(registry: &ConnectionRegistry<C>) -> Result<(), RegistryError> {
/// let db = registry.init_default().await?;
/// let reports = registry.connect("reporting").await?;
/// // ...
/// let report = registry.close_all().await;
/// assert!(report.is_clean());
/// # Ok(())
/// # }
/// ```
pub struct ConnectionRegistry<C: Connector> {
    connector: C,
    table: ConnectionTable,
    cache: Mutex<HashMap<String, Arc<Entry<C::Handle>>>>,
}

impl<C: Connector> ConnectionRegistry<C> {
    pub fn new(connector: C, table: ConnectionTable) -> Self {
        Self {
            connector,
            table,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Open the default connection ahead of first use
    ///
    /// Returns the cached handle if the default connection is already open.
    pub async fn init_default(&self) -> Result<C::Handle, RegistryError> {
        let name = self.table.default_name();
        tracing::info!(connection = name, "Initializing default database connection");
        self.connect(name).await
    }

    /// Get the handle for `name`, opening it on first use
    ///
    /// Callers that wait on an open already in flight get that open's result,
    /// error included; the driver is not retried for them.
    ///
    /// # Errors
    /// * [`RegistryError::Configuration`] - `name` is not in the connection table
    /// * [`RegistryError::Connection`] - the driver failed to open the connection;
    ///   nothing is cached
    pub async fn connect(&self, name: &str) -> Result<C::Handle, RegistryError> {
        let config = self.table.get(name).ok_or_else(|| {
            tracing::error!(connection = name, "No configuration for database connection");
            RegistryError::Configuration {
                name: name.to_string(),
            }
        })?;

        loop {
            let (entry, seen_failures) = {
                let mut cache = self.lock_cache();
                let entry = Arc::clone(cache.entry(name.to_string()).or_default());
                let seen = entry.failures.load(Ordering::SeqCst);
                (entry, seen)
            };

            let mut state = entry.state.lock().await;
            if state.evicted {
                continue;
            }

            if let Some(handle) = &state.handle {
                tracing::debug!(connection = name, "Using cached database connection");
                return Ok(handle.clone());
            }

            // An open that was in flight when we arrived has failed
            if entry.failures.load(Ordering::SeqCst) != seen_failures {
                if let Some(err) = &state.last_error {
                    return Err(err.clone());
                }
            }

            tracing::info!(
                connection = name,
                target = %config.redacted(),
                "Opening database connection"
            );

            return match self.connector.open(name, config).await {
                Ok(handle) => {
                    state.handle = Some(handle.clone());
                    state.last_error = None;
                    entry.open.store(true, Ordering::SeqCst);
                    Ok(handle)
                }
                Err(e) => {
                    tracing::error!(connection = name, error = %e, "Failed to open database connection");
                    let err = RegistryError::Connection {
                        name: name.to_string(),
                        target: config.redacted(),
                        source: Arc::new(e),
                    };
                    state.last_error = Some(err.clone());
                    entry.failures.fetch_add(1, Ordering::SeqCst);
                    Err(err)
                }
            };
        }
    }

    /// Handle of the table's default connection
    pub async fn default_connection(&self) -> Result<C::Handle, RegistryError> {
        self.connect(self.table.default_name()).await
    }

    /// Close and evict every cached connection
    ///
    /// Opens still in flight are awaited and their handles closed too. Close
    /// failures are logged and collected in the returned report; every handle
    /// is attempted. Names can be connected again afterwards and get a fresh
    /// handle.
    pub async fn close_all(&self) -> CloseReport {
        let mut drained: Vec<(String, Arc<Entry<C::Handle>>)> = self.lock_cache().drain().collect();
        drained.sort_by(|a, b| a.0.cmp(&b.0));

        let mut report = CloseReport::default();
        for (name, entry) in drained {
            let handle = {
                let mut state = entry.state.lock().await;
                state.evicted = true;
                entry.open.store(false, Ordering::SeqCst);
                state.handle.take()
            };

            // Entries whose open failed hold no handle
            let Some(handle) = handle else {
                continue;
            };

            match self.connector.close(&handle).await {
                Ok(()) => {
                    tracing::info!(connection = %name, "Closed database connection");
                    report.closed.push(name);
                }
                Err(e) => {
                    tracing::error!(connection = %name, error = %e, "Failed to close database connection");
                    report.failures.push(CloseFailure {
                        name,
                        error: Box::new(e),
                    });
                }
            }
        }

        report
    }

    /// Whether `name` currently has an open handle
    pub fn is_cached(&self, name: &str) -> bool {
        self.lock_cache()
            .get(name)
            .is_some_and(|entry| entry.open.load(Ordering::SeqCst))
    }

    /// Names with an open handle, sorted
    pub fn cached_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .lock_cache()
            .iter()
            .filter(|(_, entry)| entry.open.load(Ordering::SeqCst))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn table(&self) -> &ConnectionTable {
        &self.table
    }

    pub fn default_name(&self) -> &str {
        self.table.default_name()
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<String, Arc<Entry<C::Handle>>>> {
        // The map is never left half-updated, so a poisoned lock is still usable
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Outcome of [`ConnectionRegistry::close_all`]
#[derive(Debug, Default)]
pub struct CloseReport {
    /// Names closed successfully, sorted
    pub closed: Vec<String>,
    /// Names whose close failed
    pub failures: Vec<CloseFailure>,
}

impl CloseReport {
    /// True when every handle closed without error
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A handle that failed to close
#[derive(Debug)]
pub struct CloseFailure {
    pub name: String,
    pub error: BoxError,
}

impl std::fmt::Display for CloseReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Closed {} connection(s), {} failure(s)",
            self.closed.len(),
            self.failures.len()
        )
    }
}

//! MySQL connection configuration module

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Character set used when none is configured
pub const DEFAULT_CHARSET: &str = "utf8";
/// Session time zone used when none is configured
pub const DEFAULT_LOC: &str = "Local";
/// Connect timeout in seconds used when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
/// Pool size used when none is configured
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
/// Slow statement threshold in milliseconds used when logging is enabled
pub const DEFAULT_SLOW_THRESHOLD_MS: u64 = 200;

/// Settings for one named MySQL connection
///
/// Optional fields stay `None` until set; the accessor methods of the same
/// name resolve them to the documented defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MySqlConfig {
    /// Server host name or address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Login user
    pub username: String,

    /// Login password
    pub password: String,

    /// Schema selected after connecting
    pub database: String,

    /// Connection character set (default `utf8`)
    pub charset: Option<String>,

    /// Session location (default `Local`)
    pub loc: Option<String>,

    /// Whether DATE/DATETIME values are parsed into time values (default `true`)
    pub parse_time: Option<bool>,

    /// Connect timeout in seconds (default 15)
    pub timeout: Option<u64>,

    /// Maximum lifetime of a pooled connection in seconds (unlimited when unset)
    pub max_lifetime: Option<u64>,

    /// Maximum number of pooled connections (default 10)
    pub max_connections: Option<u32>,

    /// Log every executed statement
    pub log_mode: bool,

    /// Statements slower than this many milliseconds are logged as warnings
    pub slow_threshold_ms: Option<u64>,
}

impl Default for MySqlConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 3306,
            username: String::from("root"),
            password: String::new(),
            database: String::new(),
            charset: None,
            loc: None,
            parse_time: None,
            timeout: None,
            max_lifetime: None,
            max_connections: None,
            log_mode: false,
            slow_threshold_ms: None,
        }
    }
}

impl MySqlConfig {
    /// Create a configuration with the mandatory fields set
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn with_loc(mut self, loc: impl Into<String>) -> Self {
        self.loc = Some(loc.into());
        self
    }

    pub fn with_parse_time(mut self, parse_time: bool) -> Self {
        self.parse_time = Some(parse_time);
        self
    }

    /// Set the connect timeout in seconds
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(secs);
        self
    }

    /// Set the maximum lifetime of a pooled connection
    pub fn with_max_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_lifetime = Some(lifetime.as_secs());
        self
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = Some(max);
        self
    }

    /// Enable statement logging
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.log_mode = enable;
        self
    }

    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold_ms = Some(u64::try_from(threshold.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn charset(&self) -> &str {
        self.charset.as_deref().unwrap_or(DEFAULT_CHARSET)
    }

    pub fn loc(&self) -> &str {
        self.loc.as_deref().unwrap_or(DEFAULT_LOC)
    }

    pub fn parse_time(&self) -> bool {
        self.parse_time.unwrap_or(true)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn max_lifetime(&self) -> Option<Duration> {
        self.max_lifetime.map(Duration::from_secs)
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }

    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_threshold_ms.unwrap_or(DEFAULT_SLOW_THRESHOLD_MS))
    }

    /// Connection string in `user:password@(host:port)/database?...` form
    pub fn dsn(&self) -> String {
        self.format_dsn(&self.password)
    }

    /// Connection string with the password masked, safe for logs and errors
    pub fn redacted(&self) -> String {
        self.format_dsn("***")
    }

    fn format_dsn(&self, password: &str) -> String {
        format!(
            "{}:{}@({}:{})/{}?charset={}&parseTime={}&loc={}&timeout={}s",
            self.username,
            password,
            self.host,
            self.port,
            self.database,
            self.charset(),
            if self.parse_time() { "True" } else { "False" },
            self.loc(),
            self.timeout().as_secs(),
        )
    }
}

impl fmt::Display for MySqlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dsn())
    }
}

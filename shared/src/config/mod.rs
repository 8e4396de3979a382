//! Configuration module
//!
//! - `database` - Settings and connection string of a single MySQL connection
//! - `environment` - Environment detection and logging configuration
//!
//! The [`ConnectionTable`] defined here maps connection names to their
//! [`MySqlConfig`] and is the only input the connection registry reads.

pub mod database;
pub mod environment;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::str::FromStr;

use crate::errors::ConfigError;

// Re-export commonly used types
pub use database::MySqlConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};

/// Name of the connection returned by the default-connection shortcut
pub const DEFAULT_CONNECTION_NAME: &str = "default";

/// Prefix of environment variables that override file-based settings
const ENV_OVERRIDE_PREFIX: &str = "CONNREG";

/// Named MySQL connection settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionTable {
    /// Connection used by the default shortcut
    #[serde(default = "default_connection_name")]
    default_name: String,

    #[serde(default)]
    connections: BTreeMap<String, MySqlConfig>,
}

impl Default for ConnectionTable {
    fn default() -> Self {
        Self {
            default_name: default_connection_name(),
            connections: BTreeMap::new(),
        }
    }
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding only `config` under the default name
    pub fn single(config: MySqlConfig) -> Self {
        Self::new().with_connection(DEFAULT_CONNECTION_NAME, config)
    }

    /// Add a named connection, replacing any previous entry with that name
    pub fn with_connection(mut self, name: impl Into<String>, config: MySqlConfig) -> Self {
        self.insert(name, config);
        self
    }

    /// Change which entry the default shortcut resolves to
    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = name.into();
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, config: MySqlConfig) -> Option<MySqlConfig> {
        self.connections.insert(name.into(), config)
    }

    pub fn get(&self, name: &str) -> Option<&MySqlConfig> {
        self.connections.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Connection names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Load the table from a TOML, YAML or JSON file
    ///
    /// Values from the file can be overridden by `CONNREG__`-prefixed
    /// environment variables, with `__` separating nested keys:
    /// `CONNREG__CONNECTIONS__DEFAULT__PASSWORD=secret`.
    ///
    /// Connection names are lowercased on load, and so is `default_name`.
    ///
    /// # Example
    /// ```toml
    /// default_name = "default"
    ///
    /// [connections.default]
    /// host = "127.0.0.1"
    /// port = 3306
    /// username = "root"
    /// password = "x"
    /// database = "test"
    /// ```
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_file_with_env_prefix(path, ENV_OVERRIDE_PREFIX)
    }

    /// [`from_file`](Self::from_file) with overrides read from `{prefix}__`
    /// variables instead of `CONNREG__`
    pub fn from_file_with_env_prefix(
        path: impl AsRef<Path>,
        prefix: &str,
    ) -> Result<Self, ConfigError> {
        // Override values stay strings until a field asks for a number
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path.as_ref()))
            .add_source(::config::Environment::with_prefix(prefix).separator("__"))
            .build()?;

        let mut table: Self = settings.try_deserialize()?;
        table.default_name = table.default_name.to_lowercase();
        Ok(table)
    }

    /// Build a single default connection from `MYSQL_*` environment variables
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// `MYSQL_HOST`, `MYSQL_USER` and `MYSQL_DATABASE` are required;
    /// `MYSQL_PORT`, `MYSQL_PASSWORD`, `MYSQL_CHARSET`, `MYSQL_LOC`,
    /// `MYSQL_PARSE_TIME`, `MYSQL_TIMEOUT`, `MYSQL_MAX_LIFETIME` and
    /// `MYSQL_LOG_MODE` are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = MySqlConfig::new(
            required_var("MYSQL_HOST")?,
            parsed_var("MYSQL_PORT")?.unwrap_or(3306),
            required_var("MYSQL_USER")?,
            env::var("MYSQL_PASSWORD").unwrap_or_default(),
            required_var("MYSQL_DATABASE")?,
        );
        config.charset = env::var("MYSQL_CHARSET").ok();
        config.loc = env::var("MYSQL_LOC").ok();
        config.parse_time = parsed_var("MYSQL_PARSE_TIME")?;
        config.timeout = parsed_var("MYSQL_TIMEOUT")?;
        config.max_lifetime = parsed_var("MYSQL_MAX_LIFETIME")?;
        config.log_mode = parsed_var("MYSQL_LOG_MODE")?.unwrap_or(false);

        Ok(Self::single(config))
    }
}

fn default_connection_name() -> String {
    String::from(DEFAULT_CONNECTION_NAME)
}

fn required_var(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVar(key.to_string()))
}

fn parsed_var<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .to_lowercase()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(extension: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(extension)
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_single_uses_default_name() {
        let table = ConnectionTable::single(MySqlConfig::default());
        assert_eq!(table.default_name(), "default");
        assert!(table.contains("default"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_custom_default_name() {
        let table = ConnectionTable::new()
            .with_connection("primary", MySqlConfig::default())
            .with_connection("replica", MySqlConfig::default())
            .with_default_name("primary");

        assert_eq!(table.default_name(), "primary");
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["primary", "replica"]);
        assert!(table.get("default").is_none());
    }

    #[test]
    fn test_from_toml_file() {
        let file = write_config(
            ".toml",
            r#"
default_name = "main"

[connections.main]
host = "10.0.0.5"
port = 3307
username = "app"
password = "pw"
database = "shop"
charset = "utf8mb4"
log_mode = true

[connections.reporting]
host = "10.0.0.6"
database = "reports"
timeout = 5
"#,
        );

        let table = ConnectionTable::from_file(file.path()).unwrap();
        assert_eq!(table.default_name(), "main");
        assert_eq!(table.len(), 2);

        let main = table.get("main").unwrap();
        assert_eq!(main.port, 3307);
        assert_eq!(main.charset(), "utf8mb4");
        assert!(main.log_mode);

        let reporting = table.get("reporting").unwrap();
        assert_eq!(reporting.username, "root");
        assert_eq!(reporting.port, 3306);
        assert_eq!(reporting.timeout().as_secs(), 5);
    }

    #[test]
    fn test_default_name_is_optional_in_file() {
        let file = write_config(
            ".toml",
            r#"
[connections.default]
host = "127.0.0.1"
database = "test"
"#,
        );

        let table = ConnectionTable::from_file(file.path()).unwrap();
        assert_eq!(table.default_name(), DEFAULT_CONNECTION_NAME);
        assert!(table.contains("default"));
    }

    #[test]
    fn test_default_name_is_lowercased_like_keys() {
        let file = write_config(
            ".toml",
            r#"
default_name = "Main"

[connections.Main]
host = "127.0.0.1"
database = "test"
"#,
        );

        let table = ConnectionTable::from_file(file.path()).unwrap();
        assert_eq!(table.default_name(), "main");
        assert!(table.contains(table.default_name()));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let file = write_config(
            ".toml",
            r#"
[connections.default]
host = "127.0.0.1"
password = "x"
database = "test"
"#,
        );

        env::set_var("CRTEST_OVERRIDE__CONNECTIONS__DEFAULT__PASSWORD", "007");
        env::set_var("CRTEST_OVERRIDE__CONNECTIONS__DEFAULT__PORT", "3310");
        let table = ConnectionTable::from_file_with_env_prefix(file.path(), "CRTEST_OVERRIDE");
        env::remove_var("CRTEST_OVERRIDE__CONNECTIONS__DEFAULT__PASSWORD");
        env::remove_var("CRTEST_OVERRIDE__CONNECTIONS__DEFAULT__PORT");

        let default = table.unwrap().get("default").cloned().unwrap();
        assert_eq!(default.password, "007");
        assert_eq!(default.port, 3310);
        assert_eq!(default.host, "127.0.0.1");
    }

    #[test]
    fn test_from_env() {
        const VARS: [&str; 10] = [
            "MYSQL_HOST",
            "MYSQL_PORT",
            "MYSQL_USER",
            "MYSQL_PASSWORD",
            "MYSQL_DATABASE",
            "MYSQL_CHARSET",
            "MYSQL_LOC",
            "MYSQL_PARSE_TIME",
            "MYSQL_TIMEOUT",
            "MYSQL_LOG_MODE",
        ];
        for key in VARS {
            env::remove_var(key);
        }

        let err = ConnectionTable::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref key) if key == "MYSQL_HOST"));

        env::set_var("MYSQL_HOST", "db.internal");
        env::set_var("MYSQL_USER", "app");
        let err = ConnectionTable::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref key) if key == "MYSQL_DATABASE"));

        env::set_var("MYSQL_DATABASE", "shop");
        let table = ConnectionTable::from_env().unwrap();
        let config = table.get(DEFAULT_CONNECTION_NAME).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 3306);
        assert_eq!(config.password, "");
        assert_eq!(config.parse_time, None);
        assert!(!config.log_mode);

        env::set_var("MYSQL_PORT", "3307");
        env::set_var("MYSQL_PASSWORD", "007");
        env::set_var("MYSQL_PARSE_TIME", "False");
        env::set_var("MYSQL_LOG_MODE", " true ");
        env::set_var("MYSQL_TIMEOUT", "5");
        let table = ConnectionTable::from_env().unwrap();
        let config = table.get(DEFAULT_CONNECTION_NAME).unwrap();
        assert_eq!(config.port, 3307);
        assert_eq!(config.password, "007");
        assert_eq!(config.parse_time, Some(false));
        assert!(config.log_mode);
        assert_eq!(config.timeout().as_secs(), 5);

        env::set_var("MYSQL_PORT", "abc");
        let err = ConnectionTable::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, ref value }
            if key == "MYSQL_PORT" && value == "abc"));

        env::set_var("MYSQL_PORT", "3307");
        env::set_var("MYSQL_LOG_MODE", "sometimes");
        assert!(matches!(
            ConnectionTable::from_env(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "MYSQL_LOG_MODE"
        ));

        for key in VARS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = ConnectionTable::from_file("/nonexistent/connreg.toml");
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_parsed_var() {
        env::set_var("CONNREG_TEST_PARSED_TIMEOUT", "20");
        env::set_var("CONNREG_TEST_PARSED_FLAG", "True");
        env::set_var("CONNREG_TEST_PARSED_BAD", "soon");

        assert_eq!(parsed_var::<u64>("CONNREG_TEST_PARSED_TIMEOUT").unwrap(), Some(20));
        assert_eq!(parsed_var::<bool>("CONNREG_TEST_PARSED_FLAG").unwrap(), Some(true));
        assert_eq!(parsed_var::<u64>("CONNREG_TEST_PARSED_UNSET").unwrap(), None);
        assert!(matches!(
            parsed_var::<u64>("CONNREG_TEST_PARSED_BAD"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}

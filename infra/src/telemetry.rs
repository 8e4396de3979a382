//! Tracing subscriber installation

use tracing_subscriber::EnvFilter;

use crate::{InfrastructureError, LoggingConfig};
use cr_shared::LogFormat;

/// Install the global tracing subscriber described by `config`
///
/// `RUST_LOG`, when set, takes precedence over `config.level`. SQLx statement
/// logs are emitted under the `sqlx::query` target, so
/// `RUST_LOG=info,sqlx::query=warn` keeps only slow statements.
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), InfrastructureError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| InfrastructureError::Config(format!("Invalid log filter {:?}: {}", config.level, e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.colored)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };

    result.map_err(|e| InfrastructureError::Config(format!("Failed to install tracing subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_fails() {
        let config = LoggingConfig {
            level: String::from("cr_infra=debug"),
            format: LogFormat::Compact,
            colored: false,
            source_location: false,
        };

        let _ = init_tracing(&config);
        assert!(matches!(init_tracing(&config), Err(InfrastructureError::Config(_))));
    }
}

//! Structured logging setup
//!
//! Every crate logs through `tracing`; the binary calls [`init_logging`] once
//! at startup to install a subscriber.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (e.g., "info", "debug", "trace")
    pub level: String,
    /// Whether to use JSON format (vs. human-readable)
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            level: config.level.clone(),
            json: config.json,
        }
    }
}

/// Initialize logging for the application
///
/// `RUST_LOG` takes precedence over the configured level. Calling this twice
/// is harmless: the second subscriber is rejected and a debug line is logged.
///
/// # Example
///
/// ```
/// use stepwise_core::logging::{init_logging, LogConfig};
///
/// init_logging(LogConfig {
///     level: "debug".to_string(),
///     json: false,
/// });
/// ```
pub fn init_logging(config: LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let installed = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()
    };

    match installed {
        Ok(()) => tracing::info!("Logging initialized at level: {}", config.level),
        Err(e) => tracing::debug!("Logging already initialized: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert!(!config.json);
    }

    #[test]
    fn test_from_logging_section() {
        let section = LoggingConfig {
            level: "trace".to_string(),
            json: true,
        };
        let config = LogConfig::from(&section);
        assert_eq!(config.level, "trace");
        assert!(config.json);
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logging(LogConfig::default());
        init_logging(LogConfig::default());
    }
}

//! # Logging
//!
//! Subscriber setup for applications serving contract routes. Every crate in
//! the workspace logs through `tracing`; this module only decides where the
//! events go and in which format.

use crate::config::AppEnv;
use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    /// Enable JSON structured logging (vs plain text)
    pub json_format: bool,
    /// Enable pretty printing for development
    pub pretty_print: bool,
    /// Include file and line number information
    pub include_location: bool,
    /// Environment filter (e.g. "covenant_http=debug,tower=info")
    pub env_filter: Option<String>,
    /// Service name logged once at startup
    pub service_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            pretty_print: false,
            include_location: false,
            env_filter: None,
            service_name: None,
        }
    }
}

impl LoggingConfig {
    /// Create production logging configuration
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            json_format: true,
            env_filter: Some("info,tower=warn,axum=warn".to_string()),
            ..Self::default()
        }
    }

    /// Create development logging configuration
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            pretty_print: true,
            include_location: true,
            env_filter: Some("debug,tower=info,hyper=info".to_string()),
            ..Self::default()
        }
    }

    /// Create test logging configuration (minimal output)
    pub fn test() -> Self {
        Self {
            level: "error".to_string(),
            ..Self::default()
        }
    }

    /// Pick the preset matching an application environment
    pub fn for_env(app_env: AppEnv) -> Self {
        match app_env {
            AppEnv::Dev | AppEnv::Development => Self::development(),
            AppEnv::Spec | AppEnv::Test => Self::test(),
            AppEnv::Staging | AppEnv::Prod | AppEnv::Production => Self::production(),
        }
    }

    /// Set service name
    pub fn with_service(mut self, name: &str) -> Self {
        self.service_name = Some(name.to_string());
        self
    }

    /// Set environment filter
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the config.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = config.env_filter.as_deref().unwrap_or(&config.level);

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(env_filter))?;

    let layer = Layer::new()
        .with_writer(io::stdout)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init()?;
    } else if config.pretty_print {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.pretty())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()?;
    }

    tracing::info!(
        target: "covenant::logging",
        service = config.service_name.as_deref().unwrap_or("unknown"),
        "Logging initialized (level: {}, format: {})",
        config.level,
        if config.json_format { "JSON" } else { "text" }
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let production = LoggingConfig::production();
        assert!(production.json_format);
        assert!(!production.pretty_print);

        let development = LoggingConfig::development();
        assert_eq!(development.level, "debug");
        assert!(development.include_location);

        assert_eq!(LoggingConfig::test().level, "error");
    }

    #[test]
    fn test_preset_per_environment() {
        assert_eq!(LoggingConfig::for_env(AppEnv::Prod), LoggingConfig::production());
        assert_eq!(LoggingConfig::for_env(AppEnv::Spec), LoggingConfig::test());
        assert_eq!(LoggingConfig::for_env(AppEnv::Dev), LoggingConfig::development());
    }

    #[test]
    fn test_builders() {
        let config = LoggingConfig::default()
            .with_service("orders")
            .with_env_filter("covenant_http=trace");
        assert_eq!(config.service_name.as_deref(), Some("orders"));
        assert_eq!(config.env_filter.as_deref(), Some("covenant_http=trace"));
    }
}

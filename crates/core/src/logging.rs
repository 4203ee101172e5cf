//! # Logging
//!
//! `tracing-subscriber` setup used by the [`ConfigureLogging`] bootstrapper.
//!
//! [`ConfigureLogging`]: crate::bootstrap::ConfigureLogging

use crate::config::Environment;
use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Plain,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    pub format: LogFormat,
    /// Environment filter (supports directives like "strata_http=debug,strata_core=info")
    pub env_filter: Option<String>,
    /// Service name included in the initialisation record
    pub service_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            env_filter: None,
            service_name: None,
        }
    }
}

impl LoggingConfig {
    /// JSON output at `info`
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            env_filter: Some("strata_core=info,strata_http=info".to_string()),
            service_name: None,
        }
    }

    /// Pretty output at `debug`
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            env_filter: Some("strata_core=debug,strata_http=debug".to_string()),
            service_name: None,
        }
    }

    /// Minimal output
    pub fn test() -> Self {
        Self {
            level: "error".to_string(),
            format: LogFormat::Plain,
            env_filter: Some("strata_core=error,strata_http=error".to_string()),
            service_name: None,
        }
    }

    /// Preset for an application environment
    pub fn for_environment(environment: &Environment) -> Self {
        match environment {
            Environment::Production | Environment::Staging => Self::production(),
            Environment::Testing => Self::test(),
            Environment::Local | Environment::Development => Self::development(),
        }
    }

    /// Replace the level and drop the preset filter so the level applies everywhere
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self.env_filter = None;
        self
    }

    pub fn with_service(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Set environment filter
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Directive handed to [`EnvFilter`] when `RUST_LOG` is unset
    pub fn filter_directive(&self) -> &str {
        self.env_filter.as_deref().unwrap_or(&self.level)
    }
}

/// Install the global subscriber.
///
/// Fails instead of panicking when a subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.filter_directive()))?;

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout).json())
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout).pretty())
            .try_init()?,
        LogFormat::Plain => tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout))
            .try_init()?,
    }

    tracing::info!(
        target: "strata::logging",
        level = %config.level,
        format = ?config.format,
        service = config.service_name.as_deref().unwrap_or("strata"),
        "logging initialized"
    );

    Ok(())
}

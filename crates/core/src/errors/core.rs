use thiserror::Error;

/// Core error type for the strata framework
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service not found: {service}")]
    ServiceNotFound { service: String },

    #[error("Service '{service}' is not of the requested type '{expected}'")]
    ServiceTypeMismatch { service: String, expected: String },

    #[error("Invalid alias '{alias}': {message}")]
    InvalidAlias { alias: String, message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Bootstrap error in '{bootstrapper}': {source}")]
    Bootstrap {
        bootstrapper: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CoreError {
    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new service not found error
    pub fn service_not_found(service: impl Into<String>) -> Self {
        Self::ServiceNotFound {
            service: service.into(),
        }
    }

    /// Create a new invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Wrap a failure raised while running a bootstrapper
    pub fn bootstrap(
        bootstrapper: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Bootstrap {
            bootstrapper: bootstrapper.into(),
            source: source.into(),
        }
    }

    /// Check if the error is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Check if the error is a service lookup error
    pub fn is_service(&self) -> bool {
        matches!(
            self,
            Self::ServiceNotFound { .. } | Self::ServiceTypeMismatch { .. }
        )
    }
}

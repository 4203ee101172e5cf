use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired { field: String, hint: String },

    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Cannot set '{key}': segment '{segment}' is not an object")]
    NotAnObject { key: String, segment: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Create a missing required field error
    pub fn missing_required(field: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingRequired {
            field: field.into(),
            hint: hint.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}

impl From<ConfigError> for crate::errors::CoreError {
    fn from(error: ConfigError) -> Self {
        crate::errors::CoreError::configuration(error.to_string())
    }
}

/// Log levels accepted by `AppConfig::log_level`
pub const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Validate a log level string
pub fn validate_log_level(level: &str) -> Result<(), ConfigError> {
    if VALID_LOG_LEVELS.contains(&level) {
        return Ok(());
    }

    Err(ConfigError::invalid_value(
        "log_level",
        level,
        format!("one of: {}", VALID_LOG_LEVELS.join(", ")),
    ))
}

/// Validate a locale identifier such as `en` or `pt_BR`
pub fn validate_locale(field: &str, locale: &str) -> Result<(), ConfigError> {
    let valid = !locale.is_empty()
        && locale
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(
            field,
            locale,
            "a locale identifier like 'en' or 'pt_BR'",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_validation() {
        assert!(validate_log_level("debug").is_ok());
        let err = validate_log_level("verbose").unwrap_err();
        assert!(err.to_string().contains("one of: error, warn, info, debug, trace"));
    }

    #[test]
    fn test_locale_validation() {
        assert!(validate_locale("locale", "en").is_ok());
        assert!(validate_locale("locale", "pt_BR").is_ok());
        assert!(validate_locale("locale", "").is_err());
        assert!(validate_locale("locale", "en us").is_err());
    }
}

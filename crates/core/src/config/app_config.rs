use crate::config::validation::{validate_locale, validate_log_level};
use crate::config::{ConfigError, ConfigSource};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;

/// Configuration trait for application configuration
pub trait AppConfigTrait: Sized {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self, ConfigError>;

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError>;

    /// Get configuration source information for debugging
    fn config_sources(&self) -> HashMap<String, ConfigSource>;
}

/// Environment enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Local,
    Development,
    Testing,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::invalid_value(
                "environment",
                s,
                "local, development, testing, staging, or production",
            )),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Environment {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Check if environment is local
    pub fn is_local(&self) -> bool {
        matches!(self, Environment::Local)
    }

    /// Check if environment is testing
    pub fn is_testing(&self) -> bool {
        matches!(self, Environment::Testing)
    }

    /// Check if environment is production
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Get debug mode status based on environment
    pub fn debug_mode(&self) -> bool {
        !matches!(self, Environment::Production | Environment::Staging)
    }
}

/// Typed application settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
    pub debug: bool,
    pub locale: String,
    pub fallback_locale: String,
    pub timezone: String,
    pub log_level: String,
}

impl AppConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self {
            name: "strata".to_string(),
            environment: Environment::Production,
            debug: false,
            locale: "en".to_string(),
            fallback_locale: "en".to_string(),
            timezone: "UTC".to_string(),
            log_level: "info".to_string(),
        }
    }

    /// Create configuration for development
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            debug: true,
            log_level: "debug".to_string(),
            ..Self::new()
        }
    }

    /// Create configuration for testing
    pub fn testing() -> Self {
        Self {
            environment: Environment::Testing,
            debug: true,
            log_level: "warn".to_string(),
            ..Self::new()
        }
    }

    /// Create configuration for production
    pub fn production() -> Self {
        Self::new()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfigTrait for AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Ok(name) = env::var("APP_NAME") {
            config.name = name;
        }

        if let Ok(env_str) = env::var("APP_ENV") {
            config.environment = env_str.parse()?;
        }

        // Debug mode defaults based on environment if not set
        config.debug = match env::var("APP_DEBUG") {
            Ok(debug_str) => parse_bool(&debug_str).ok_or_else(|| {
                ConfigError::invalid_value("debug", debug_str.clone(), "true or false")
            })?,
            Err(_) => config.environment.debug_mode(),
        };

        if let Ok(locale) = env::var("APP_LOCALE") {
            config.locale = locale;
        }

        if let Ok(fallback) = env::var("APP_FALLBACK_LOCALE") {
            config.fallback_locale = fallback;
        }

        if let Ok(timezone) = env::var("APP_TIMEZONE") {
            config.timezone = timezone;
        }

        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.log_level = log_level.to_lowercase();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::missing_required(
                "name",
                "APP_NAME must not be empty",
            ));
        }

        validate_log_level(&self.log_level)?;
        validate_locale("locale", &self.locale)?;
        validate_locale("fallback_locale", &self.fallback_locale)?;

        if self.environment.is_production() && self.debug {
            return Err(ConfigError::invalid_value(
                "debug",
                "true",
                "false in production environment",
            ));
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let fields = [
            ("name", "APP_NAME", "strata"),
            ("environment", "APP_ENV", "production"),
            ("debug", "APP_DEBUG", "based on environment"),
            ("locale", "APP_LOCALE", "en"),
            ("fallback_locale", "APP_FALLBACK_LOCALE", "en"),
            ("timezone", "APP_TIMEZONE", "UTC"),
            ("log_level", "LOG_LEVEL", "info"),
        ];

        fields
            .iter()
            .map(|(field, var, default)| {
                let source = if env::var(var).is_ok() {
                    ConfigSource::EnvVar(var.to_string())
                } else {
                    ConfigSource::Default(default.to_string())
                };
                (field.to_string(), source)
            })
            .collect()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in [
            "APP_NAME",
            "APP_ENV",
            "APP_DEBUG",
            "APP_LOCALE",
            "APP_FALLBACK_LOCALE",
            "APP_TIMEZONE",
            "LOG_LEVEL",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("LOCAL".parse::<Environment>().unwrap(), Environment::Local);
        assert!("moon".parse::<Environment>().is_err());
        assert_eq!(Environment::Staging.to_string(), "staging");
    }

    #[test]
    fn test_debug_not_allowed_in_production() {
        let mut config = AppConfig::production();
        config.debug = true;
        assert!(config.validate().is_err());

        assert!(AppConfig::development().validate().is_ok());
        assert!(AppConfig::testing().validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert!(!config.debug);

        let sources = config.config_sources();
        assert!(sources["environment"].is_default());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        env::set_var("APP_ENV", "local");
        env::set_var("APP_LOCALE", "pt_BR");
        env::set_var("LOG_LEVEL", "DEBUG");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.environment, Environment::Local);
        assert!(config.debug);
        assert_eq!(config.locale, "pt_BR");
        assert_eq!(config.log_level, "debug");
        assert!(config.config_sources()["locale"].is_env_var());

        env::set_var("APP_DEBUG", "maybe");
        assert!(AppConfig::from_env().is_err());
        clear_env();
    }
}

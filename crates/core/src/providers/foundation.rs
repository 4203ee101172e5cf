use crate::config::ConfigRepository;
use crate::errors::CoreError;
use crate::providers::{ProviderContext, ProviderError, ServiceProvider};
use serde_json::json;

/// Framework provider registered ahead of every configured provider
#[derive(Debug, Default)]
pub struct FoundationServiceProvider;

impl FoundationServiceProvider {
    pub const NAME: &'static str = "FoundationServiceProvider";
}

impl ServiceProvider for FoundationServiceProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> Option<&'static str> {
        Some("Publishes framework configuration defaults")
    }

    fn register(&mut self, ctx: &ProviderContext<'_>) -> Result<(), ProviderError> {
        let app = ctx.app();
        let config = app.config();
        let repository = app.repository();

        let defaults = [
            ("app_name", json!(config.name)),
            ("app_env", json!(config.environment.as_str())),
        ];

        for (key, value) in defaults {
            if !repository.has(key) {
                repository.set(key, value).map_err(CoreError::from)?;
            }
        }

        Ok(())
    }

    fn boot(&mut self, ctx: &ProviderContext<'_>) -> Result<(), ProviderError> {
        let app = ctx.app();
        let repository = app.repository();

        if !repository.has("app.timezone") {
            repository
                .set("app.timezone", json!(app.config().timezone))
                .map_err(CoreError::from)?;
        }

        tracing::info!(
            environment = %app.config().environment,
            timezone = %app.config().timezone,
            "Foundation booted"
        );
        Ok(())
    }
}

//! # Bootstrap
//!
//! Steps run by [`Application::bootstrap_with`] before the application serves
//! anything: logging setup, provider registration and the boot pass.

use crate::config::ConfigRepository;
use crate::errors::CoreError;
use crate::foundation::Application;
use crate::logging::{init_logging, LoggingConfig};
use crate::providers::FoundationServiceProvider;
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;

/// A single bootstrap step
pub trait Bootstrapper: Send + Sync {
    /// Name announced in the `bootstrapping: <name>` / `bootstrapped: <name>` events
    fn name(&self) -> &'static str;

    fn bootstrap(&self, app: &Application) -> Result<(), CoreError>;
}

/// The default bootstrap sequence
pub fn default_bootstrappers() -> Vec<Box<dyn Bootstrapper>> {
    vec![
        Box::new(ConfigureLogging),
        Box::new(RegisterProviders),
        Box::new(BootProviders),
    ]
}

/// Install the tracing subscriber for the application environment
#[derive(Debug, Default)]
pub struct ConfigureLogging;

impl Bootstrapper for ConfigureLogging {
    fn name(&self) -> &'static str {
        "ConfigureLogging"
    }

    fn bootstrap(&self, app: &Application) -> Result<(), CoreError> {
        let mut config = LoggingConfig::for_environment(&app.config().environment)
            .with_service(app.config().name.clone());

        if let Some(level) = app.repository().get_str("app.log_level") {
            config = config.with_level(level);
        }

        // Another subscriber (a test harness, the host binary) keeps precedence
        if let Err(error) = init_logging(config) {
            tracing::warn!(%error, "logging already initialized, keeping existing subscriber");
        }

        Ok(())
    }
}

/// Register the providers listed in configuration.
///
/// Providers come from `app.discovered` (package name to provider names) and
/// `app.providers`. Packages named in `app.dont_discover` are skipped, `*`
/// skips every discovered package. Duplicates keep their first position and
/// the foundation provider is moved to the front.
#[derive(Debug, Default)]
pub struct RegisterProviders;

impl RegisterProviders {
    /// Provider names in registration order
    pub fn provider_names(repository: &Arc<dyn ConfigRepository>) -> Result<Vec<String>, CoreError> {
        let ignored: Vec<String> = repository.get_as("app.dont_discover")?.unwrap_or_default();
        let mut names = IndexSet::new();

        if !ignored.iter().any(|package| package == "*") {
            let discovered: IndexMap<String, Vec<String>> =
                repository.get_as("app.discovered")?.unwrap_or_default();

            for (package, providers) in discovered {
                if ignored.contains(&package) {
                    tracing::debug!(package = %package, "skipping undiscovered package");
                    continue;
                }
                names.extend(providers);
            }
        }

        let configured: Vec<String> = repository.get_as("app.providers")?.unwrap_or_default();
        names.extend(configured);

        if let Some(index) = names.get_index_of(FoundationServiceProvider::NAME) {
            names.move_index(index, 0);
        }

        Ok(names.into_iter().collect())
    }
}

impl Bootstrapper for RegisterProviders {
    fn name(&self) -> &'static str {
        "RegisterProviders"
    }

    fn bootstrap(&self, app: &Application) -> Result<(), CoreError> {
        for name in Self::provider_names(app.repository())? {
            app.register(name, false)
                .map_err(|error| CoreError::bootstrap(self.name(), error))?;
        }

        Ok(())
    }
}

/// Boot every registered provider
#[derive(Debug, Default)]
pub struct BootProviders;

impl Bootstrapper for BootProviders {
    fn name(&self) -> &'static str {
        "BootProviders"
    }

    fn bootstrap(&self, app: &Application) -> Result<(), CoreError> {
        app.boot()
            .map_err(|error| CoreError::bootstrap(self.name(), error))
    }
}

use crate::bootstrap::Bootstrapper;
use crate::config::{AppConfig, ConfigRepository, Repository};
use crate::container::Container;
use crate::errors::CoreError;
use crate::events::{bootstrapped_event, bootstrapping_event, Event, EventDispatcher};
use crate::foundation::paths::{join_paths, normalize_base, wildcard_match};
use crate::foundation::{MemoryTranslator, Translator};
use crate::providers::{
    fire_callbacks, FoundationServiceProvider, LifecycleCallback, ProviderError, ProviderRegistry,
    ProviderSource, RegisteredProvider, ServiceProvider,
};
use parking_lot::Mutex;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// The application: service container, provider registry and lifecycle
pub struct Application {
    base_path: PathBuf,
    config: AppConfig,
    repository: Arc<dyn ConfigRepository>,
    translator: Arc<dyn Translator>,
    container: Container,
    events: Arc<EventDispatcher>,
    providers: ProviderRegistry,
    booted: AtomicBool,
    boot_in_progress: AtomicBool,
    has_been_bootstrapped: AtomicBool,
    booting_callbacks: Mutex<Vec<LifecycleCallback>>,
    booted_callbacks: Mutex<Vec<LifecycleCallback>>,
    namespace: OnceLock<String>,
}

impl Application {
    /// Create an application rooted at `base_path` with default settings
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self::builder().base_path(base_path).build()
    }

    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::default()
    }

    /// Framework version
    pub fn version(&self) -> &'static str {
        crate::VERSION
    }

    /// Typed application settings
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Configuration repository, also bound as `config`
    pub fn repository(&self) -> &Arc<dyn ConfigRepository> {
        &self.repository
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    pub fn translator(&self) -> &Arc<dyn Translator> {
        &self.translator
    }

    // Providers

    /// Register a provider given as an instance or by name.
    ///
    /// Without `force`, an already registered provider is returned untouched.
    /// The provider is only recorded once its `register` hook succeeded; when
    /// the application has already booted, the provider boots right away.
    pub fn register(
        &self,
        source: impl Into<ProviderSource>,
        force: bool,
    ) -> Result<Arc<RegisteredProvider>, ProviderError> {
        let source = source.into();

        if !force {
            if let Some(existing) = self.providers.get(source.name()) {
                tracing::debug!(provider = %existing.name(), "provider already registered");
                return Ok(existing);
            }
        }

        let provider = match source {
            ProviderSource::Name(name) => self.providers.build(&name, self)?,
            ProviderSource::Instance(provider) => provider,
        };

        let registered = Arc::new(RegisteredProvider::new(provider));
        let bindings = registered.run_register(self)?;

        for binding in bindings {
            self.container.bind_binding(binding);
        }

        self.providers.mark_as_registered(registered.clone());
        tracing::info!(provider = %registered.name(), force, "provider registered");

        if self.is_booted() {
            self.boot_provider(&registered)?;
        }

        Ok(registered)
    }

    /// Registered provider for a name
    pub fn get_provider(&self, name: &str) -> Option<Arc<RegisteredProvider>> {
        self.providers.get(name)
    }

    /// Registered providers whose concrete type is `P`
    pub fn get_providers<P: ServiceProvider>(&self) -> Vec<Arc<RegisteredProvider>> {
        self.providers.of_type::<P>()
    }

    /// Make a provider available to [`Application::register`] by name
    pub fn register_provider_factory<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Application) -> Box<dyn ServiceProvider> + Send + Sync + 'static,
    {
        self.providers.add_factory(name, Arc::new(factory));
    }

    /// Build a provider through the factory table without registering it
    pub fn resolve_provider(&self, name: &str) -> Result<Box<dyn ServiceProvider>, ProviderError> {
        self.providers.build(name, self)
    }

    /// Names of the registered providers in registration order
    pub fn get_loaded_providers(&self) -> Vec<String> {
        self.providers.names()
    }

    pub fn provider_is_loaded(&self, name: &str) -> bool {
        self.providers.contains(name)
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    // Boot

    pub fn is_booted(&self) -> bool {
        self.booted.load(Ordering::Acquire)
    }

    /// Boot every registered provider; later calls are no-ops
    pub fn boot(&self) -> Result<(), ProviderError> {
        if self.is_booted() {
            return Ok(());
        }

        if self
            .boot_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("boot already in progress");
            return Ok(());
        }

        let result = self.run_boot();
        self.boot_in_progress.store(false, Ordering::Release);
        result
    }

    fn run_boot(&self) -> Result<(), ProviderError> {
        tracing::debug!("firing booting callbacks");
        fire_callbacks(self, &self.booting_callbacks)?;

        // Providers registered while booting join the pass, including forced
        // replacements of slots the pass already went through
        while let Some(provider) = self.providers.first_unbooted() {
            self.boot_provider(&provider)?;
        }

        self.booted.store(true, Ordering::Release);
        tracing::info!(providers = self.providers.provider_count(), "application booted");

        tracing::debug!("firing booted callbacks");
        fire_callbacks(self, &self.booted_callbacks)
    }

    fn boot_provider(&self, provider: &RegisteredProvider) -> Result<(), ProviderError> {
        if provider.is_booted() {
            return Ok(());
        }

        provider.run_boot(self)?;
        tracing::debug!(provider = %provider.name(), "provider booted");
        Ok(())
    }

    /// Run a callback before providers boot
    pub fn booting<F>(&self, callback: F)
    where
        F: Fn(&Application) -> Result<(), ProviderError> + Send + Sync + 'static,
    {
        self.booting_callbacks.lock().push(Arc::new(callback));
    }

    /// Run a callback once the application booted; runs immediately if it already has
    pub fn booted<F>(&self, callback: F) -> Result<(), ProviderError>
    where
        F: Fn(&Application) -> Result<(), ProviderError> + Send + Sync + 'static,
    {
        if self.is_booted() {
            return callback(self);
        }

        self.booted_callbacks.lock().push(Arc::new(callback));
        Ok(())
    }

    // Bootstrap

    /// Run bootstrappers in order, announcing each one through the event dispatcher
    pub fn bootstrap_with(&self, bootstrappers: &[Box<dyn Bootstrapper>]) -> Result<(), CoreError> {
        self.has_been_bootstrapped.store(true, Ordering::Release);

        for bootstrapper in bootstrappers {
            let name = bootstrapper.name();
            self.events
                .dispatch(self, &Event::Bootstrapping(name.to_string()));

            tracing::debug!(bootstrapper = name, "bootstrapping");
            bootstrapper.bootstrap(self)?;

            self.events
                .dispatch(self, &Event::Bootstrapped(name.to_string()));
        }

        Ok(())
    }

    /// Listen for the moment right before a bootstrapper runs
    pub fn before_bootstrapping<F>(&self, bootstrapper: &str, callback: F)
    where
        F: Fn(&Application) + Send + Sync + 'static,
    {
        self.events
            .listen(bootstrapping_event(bootstrapper), move |app, _| callback(app));
    }

    /// Listen for the moment right after a bootstrapper ran
    pub fn after_bootstrapping<F>(&self, bootstrapper: &str, callback: F)
    where
        F: Fn(&Application) + Send + Sync + 'static,
    {
        self.events
            .listen(bootstrapped_event(bootstrapper), move |app, _| callback(app));
    }

    pub fn has_been_bootstrapped(&self) -> bool {
        self.has_been_bootstrapped.load(Ordering::Acquire)
    }

    // Paths

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path inside the `app` directory
    pub fn path(&self, path: &str) -> PathBuf {
        join_paths(&self.base_path.join("app"), path)
    }

    pub fn config_path(&self, path: &str) -> PathBuf {
        join_paths(&self.base_path.join("config"), path)
    }

    pub fn database_path(&self, path: &str) -> PathBuf {
        join_paths(&self.base_path.join("database"), path)
    }

    pub fn lang_path(&self, path: &str) -> PathBuf {
        join_paths(&self.base_path.join("lang"), path)
    }

    pub fn public_path(&self, path: &str) -> PathBuf {
        join_paths(&self.base_path.join("public"), path)
    }

    pub fn resource_path(&self, path: &str) -> PathBuf {
        join_paths(&self.base_path.join("resources"), path)
    }

    pub fn storage_path(&self, path: &str) -> PathBuf {
        join_paths(&self.base_path.join("storage"), path)
    }

    /// Path inside the view directory; `view.config.view_path` overrides the default
    pub fn view_path(&self, path: &str) -> PathBuf {
        let views = match self.repository.get_str("view.config.view_path") {
            Some(configured) => PathBuf::from(configured),
            None => self.resource_path("views"),
        };

        join_paths(&views, path)
    }

    // Environment

    /// Current environment name; `app_env` in the repository wins over the typed config
    pub fn environment(&self) -> String {
        self.repository
            .get_str("app_env")
            .unwrap_or_else(|| self.config.environment.as_str().to_string())
    }

    /// Match the environment against patterns; `*` matches any run of characters
    pub fn environment_is(&self, patterns: &[&str]) -> bool {
        let environment = self.environment();
        patterns
            .iter()
            .any(|pattern| wildcard_match(pattern, &environment))
    }

    pub fn is_local(&self) -> bool {
        self.environment_is(&["local"])
    }

    pub fn is_production(&self) -> bool {
        self.environment_is(&["production"])
    }

    pub fn running_unit_tests(&self) -> bool {
        self.environment_is(&["testing"])
    }

    pub fn has_debug_mode_enabled(&self) -> bool {
        self.repository
            .get("app.debug")
            .and_then(|value| value.as_bool())
            .unwrap_or(self.config.debug)
    }

    /// Application namespace read from `app.namespace`
    pub fn namespace(&self) -> Result<String, CoreError> {
        if let Some(namespace) = self.namespace.get() {
            return Ok(namespace.clone());
        }

        let namespace = self
            .repository
            .get_str("app.namespace")
            .filter(|namespace| !namespace.is_empty())
            .ok_or_else(|| CoreError::configuration("Unable to detect application namespace."))?;

        Ok(self.namespace.get_or_init(|| namespace).clone())
    }

    // Locale

    pub fn get_locale(&self) -> String {
        self.translator.locale()
    }

    pub fn current_locale(&self) -> String {
        self.get_locale()
    }

    pub fn get_fallback_locale(&self) -> String {
        self.translator.fallback()
    }

    pub fn is_locale(&self, locale: &str) -> bool {
        self.get_locale() == locale
    }

    /// Switch the locale and announce it with [`Event::LocaleUpdated`]
    pub fn set_locale(&self, locale: &str) -> Result<(), CoreError> {
        self.repository.set("app.locale", json!(locale))?;
        self.translator.set_locale(locale);

        tracing::debug!(locale, "locale updated");
        self.events.dispatch(
            self,
            &Event::LocaleUpdated {
                locale: locale.to_string(),
            },
        );
        Ok(())
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("base_path", &self.base_path)
            .field("environment", &self.config.environment)
            .field("providers", &self.providers)
            .field("booted", &self.is_booted())
            .finish()
    }
}

/// Builder for [`Application`]
#[derive(Default)]
pub struct ApplicationBuilder {
    base_path: Option<PathBuf>,
    config: Option<AppConfig>,
    repository: Option<Arc<dyn ConfigRepository>>,
    translator: Option<Arc<dyn Translator>>,
}

impl ApplicationBuilder {
    pub fn base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn repository(mut self, repository: impl ConfigRepository + 'static) -> Self {
        self.repository = Some(Arc::new(repository));
        self
    }

    pub fn translator(mut self, translator: impl Translator + 'static) -> Self {
        self.translator = Some(Arc::new(translator));
        self
    }

    pub fn build(self) -> Application {
        let base_path = normalize_base(&self.base_path.unwrap_or_else(|| PathBuf::from(".")));
        let config = self.config.unwrap_or_default();
        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(Repository::new()));
        let translator = self.translator.unwrap_or_else(|| {
            Arc::new(MemoryTranslator::new(
                config.locale.clone(),
                config.fallback_locale.clone(),
            ))
        });
        let events = Arc::new(EventDispatcher::new());

        let container = Container::new();
        container.instance("config", repository.clone());
        container.instance("translator", translator.clone());
        container.instance("events", events.clone());
        if let Err(error) = container.alias("config", "app.config") {
            tracing::warn!(%error, "unable to alias the config repository");
        }

        let providers = ProviderRegistry::new();
        providers.add_factory(
            FoundationServiceProvider::NAME,
            Arc::new(|_: &Application| -> Box<dyn ServiceProvider> {
                Box::new(FoundationServiceProvider)
            }),
        );

        Application {
            base_path,
            config,
            repository,
            translator,
            container,
            events,
            providers,
            booted: AtomicBool::new(false),
            boot_in_progress: AtomicBool::new(false),
            has_been_bootstrapped: AtomicBool::new(false),
            booting_callbacks: Mutex::new(Vec::new()),
            booted_callbacks: Mutex::new(Vec::new()),
            namespace: OnceLock::new(),
        }
    }
}

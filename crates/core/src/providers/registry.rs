use crate::foundation::Application;
use crate::providers::{
    ProviderContext, ProviderError, ProviderFactory, ProviderHooks, ProviderMetadata,
    ProviderState, ServiceProvider,
};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// A provider instance tracked by the application
pub struct RegisteredProvider {
    name: &'static str,
    type_id: TypeId,
    provider: Mutex<Box<dyn ServiceProvider>>,
    hooks: ProviderHooks,
    state: Mutex<ProviderState>,
}

impl RegisteredProvider {
    pub(crate) fn new(provider: Box<dyn ServiceProvider>) -> Self {
        Self {
            name: provider.name(),
            type_id: (*provider).as_any().type_id(),
            provider: Mutex::new(provider),
            hooks: ProviderHooks::default(),
            state: Mutex::new(ProviderState::Unregistered),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> ProviderState {
        *self.state.lock()
    }

    pub fn is_booted(&self) -> bool {
        self.state() == ProviderState::Booted
    }

    /// Pending (booting, booted) callback counts
    pub fn pending_callbacks(&self) -> (usize, usize) {
        self.hooks.pending()
    }

    /// Check the concrete provider type; never waits on a provider that is running
    pub fn is<P: ServiceProvider>(&self) -> bool {
        self.type_id == TypeId::of::<P>()
    }

    /// Run a closure against the provider when it has the given concrete type.
    ///
    /// Locks the provider, so calling this for a provider from inside its own
    /// `register` or `boot` blocks.
    pub fn with<P: ServiceProvider, R>(&self, f: impl FnOnce(&P) -> R) -> Option<R> {
        if !self.is::<P>() {
            return None;
        }

        let provider = self.provider.lock();
        (**provider).as_any().downcast_ref::<P>().map(f)
    }

    pub fn metadata(&self) -> ProviderMetadata {
        let provider = self.provider.lock();
        ProviderMetadata::from_provider(&**provider, self.state())
    }

    /// Run the provider's `register` hook and collect its static bindings
    pub(crate) fn run_register(
        &self,
        app: &Application,
    ) -> Result<Vec<crate::container::Binding>, ProviderError> {
        let mut provider = self.provider.lock();
        let ctx = ProviderContext::new(app, &self.hooks);
        provider.register(&ctx)?;
        Ok(provider.bindings())
    }

    pub(crate) fn mark_registered(&self) {
        *self.state.lock() = ProviderState::Registered;
    }

    /// Booting hooks, `boot`, then booted hooks; a booted provider is left alone
    pub(crate) fn run_boot(&self, app: &Application) -> Result<(), ProviderError> {
        if self.is_booted() {
            return Ok(());
        }

        self.hooks.call_booting(app)?;

        {
            let mut provider = self.provider.lock();
            let ctx = ProviderContext::new(app, &self.hooks);
            provider.boot(&ctx)?;
        }

        *self.state.lock() = ProviderState::Booted;
        self.hooks.call_booted(app)
    }
}

impl std::fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

/// Provider registry: registered instances in registration order plus the
/// factory table used to build providers from their names
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<IndexMap<String, Arc<RegisteredProvider>>>,
    factories: RwLock<HashMap<String, ProviderFactory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a factory for a provider name
    pub fn add_factory(&self, name: impl Into<String>, factory: ProviderFactory) {
        self.factories.write().insert(name.into(), factory);
    }

    pub fn has_factory(&self, name: &str) -> bool {
        self.factories.read().contains_key(name)
    }

    /// Build a provider through its factory
    pub fn build(&self, name: &str, app: &Application) -> Result<Box<dyn ServiceProvider>, ProviderError> {
        let factory = self
            .factories
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider {
                provider: name.to_string(),
            })?;

        Ok(factory(app))
    }

    /// Get the registered provider for a name
    pub fn get(&self, name: &str) -> Option<Arc<RegisteredProvider>> {
        self.providers.read().get(name).cloned()
    }

    /// Earliest registered provider that has not booted yet
    pub fn first_unbooted(&self) -> Option<Arc<RegisteredProvider>> {
        self.providers
            .read()
            .values()
            .find(|provider| !provider.is_booted())
            .cloned()
    }

    /// Record a provider; a forced re-registration keeps the original position
    pub(crate) fn mark_as_registered(&self, provider: Arc<RegisteredProvider>) {
        provider.mark_registered();
        self.providers
            .write()
            .insert(provider.name().to_string(), provider);
    }

    /// Providers whose concrete type is `P`
    pub fn of_type<P: ServiceProvider>(&self) -> Vec<Arc<RegisteredProvider>> {
        self.all().into_iter().filter(|p| p.is::<P>()).collect()
    }

    /// All registered providers in registration order
    pub fn all(&self) -> Vec<Arc<RegisteredProvider>> {
        self.providers.read().values().cloned().collect()
    }

    /// Names of the registered providers in registration order
    pub fn names(&self) -> Vec<String> {
        self.providers.read().keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.read().contains_key(name)
    }

    /// Get the number of registered providers
    pub fn provider_count(&self) -> usize {
        self.providers.read().len()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .field("factories", &self.factories.read().len())
            .finish()
    }
}

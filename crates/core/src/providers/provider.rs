use crate::container::Binding;
use crate::errors::CoreError;
use crate::foundation::Application;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;

/// Provider error type
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("No provider factory is registered for '{provider}'")]
    UnknownProvider { provider: String },

    #[error("Provider registration failed: {message}")]
    RegistrationFailed { message: String },

    #[error("Provider boot failed: {message}")]
    BootFailed { message: String },

    #[error("Container error: {0}")]
    Container(#[from] CoreError),
}

impl ProviderError {
    pub fn registration_failed(message: impl Into<String>) -> Self {
        Self::RegistrationFailed {
            message: message.into(),
        }
    }

    pub fn boot_failed(message: impl Into<String>) -> Self {
        Self::BootFailed {
            message: message.into(),
        }
    }
}

/// Upcast helper so registered providers can be inspected by concrete type
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Service provider trait for registering services and managing lifecycle
pub trait ServiceProvider: AsAny + Send + Sync {
    /// Provider identity; one instance per name is tracked by the application
    fn name(&self) -> &'static str;

    /// Register services; runs once per registration
    fn register(&mut self, ctx: &ProviderContext<'_>) -> Result<(), ProviderError>;

    /// Boot the provider once every configured provider has been registered
    fn boot(&mut self, ctx: &ProviderContext<'_>) -> Result<(), ProviderError> {
        let _ = ctx;
        Ok(())
    }

    /// Container bindings applied right after a successful `register`
    fn bindings(&self) -> Vec<Binding> {
        Vec::new()
    }

    /// Provider description
    fn description(&self) -> Option<&'static str> {
        None
    }
}

/// Callback fired by the application or around a provider's boot
pub type LifecycleCallback = Arc<dyn Fn(&Application) -> Result<(), ProviderError> + Send + Sync>;

/// Drain a callback list by index so callbacks appended while firing still run
pub(crate) fn fire_callbacks(
    app: &Application,
    callbacks: &Mutex<Vec<LifecycleCallback>>,
) -> Result<(), ProviderError> {
    let mut index = 0;

    loop {
        let callback = match callbacks.lock().get(index) {
            Some(callback) => callback.clone(),
            None => return Ok(()),
        };

        callback(app)?;
        index += 1;
    }
}

/// Booting/booted callbacks a provider registered for itself
#[derive(Default)]
pub struct ProviderHooks {
    booting: Mutex<Vec<LifecycleCallback>>,
    booted: Mutex<Vec<LifecycleCallback>>,
}

impl ProviderHooks {
    pub(crate) fn call_booting(&self, app: &Application) -> Result<(), ProviderError> {
        fire_callbacks(app, &self.booting)
    }

    pub(crate) fn call_booted(&self, app: &Application) -> Result<(), ProviderError> {
        fire_callbacks(app, &self.booted)
    }

    pub fn pending(&self) -> (usize, usize) {
        (self.booting.lock().len(), self.booted.lock().len())
    }
}

/// Handle passed to `register` and `boot`
pub struct ProviderContext<'a> {
    app: &'a Application,
    hooks: &'a ProviderHooks,
}

impl<'a> ProviderContext<'a> {
    pub(crate) fn new(app: &'a Application, hooks: &'a ProviderHooks) -> Self {
        Self { app, hooks }
    }

    /// The application the provider is registered with
    pub fn app(&self) -> &'a Application {
        self.app
    }

    /// Run a callback right before this provider boots
    pub fn booting<F>(&self, callback: F)
    where
        F: Fn(&Application) -> Result<(), ProviderError> + Send + Sync + 'static,
    {
        self.hooks.booting.lock().push(Arc::new(callback));
    }

    /// Run a callback right after this provider booted
    pub fn booted<F>(&self, callback: F)
    where
        F: Fn(&Application) -> Result<(), ProviderError> + Send + Sync + 'static,
    {
        self.hooks.booted.lock().push(Arc::new(callback));
    }
}

/// Lifecycle of a tracked provider; transitions only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProviderState {
    Unregistered,
    Registered,
    Booted,
}

/// Provider metadata for introspection
#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    pub name: String,
    pub description: Option<String>,
    pub state: ProviderState,
}

impl ProviderMetadata {
    /// Create metadata from a provider
    pub fn from_provider<P: ServiceProvider + ?Sized>(provider: &P, state: ProviderState) -> Self {
        Self {
            name: provider.name().to_string(),
            description: provider.description().map(|d| d.to_string()),
            state,
        }
    }
}

/// Where `Application::register` gets its provider from
pub enum ProviderSource {
    /// Resolve through the provider factory table
    Name(String),
    /// Use this instance
    Instance(Box<dyn ServiceProvider>),
}

impl ProviderSource {
    /// Identity the application tracks the provider under
    pub fn name(&self) -> &str {
        match self {
            ProviderSource::Name(name) => name,
            ProviderSource::Instance(provider) => provider.name(),
        }
    }
}

impl From<&str> for ProviderSource {
    fn from(name: &str) -> Self {
        ProviderSource::Name(name.to_string())
    }
}

impl From<String> for ProviderSource {
    fn from(name: String) -> Self {
        ProviderSource::Name(name)
    }
}

impl<P: ServiceProvider> From<P> for ProviderSource {
    fn from(provider: P) -> Self {
        ProviderSource::Instance(Box::new(provider))
    }
}

/// Factory used to build a provider from its name
pub type ProviderFactory = Arc<dyn Fn(&Application) -> Box<dyn ServiceProvider> + Send + Sync>;

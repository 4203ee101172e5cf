pub mod bootstrap;
pub mod config;
pub mod container;
pub mod errors;
pub mod events;
pub mod foundation;
pub mod logging;
pub mod providers;

// Re-export key types for convenience
pub use bootstrap::{default_bootstrappers, BootProviders, Bootstrapper, ConfigureLogging, RegisterProviders};
pub use config::validation::ConfigError;
pub use config::{AppConfig, AppConfigTrait, ConfigRepository, ConfigSource, Environment, Repository};
pub use container::{Binding, Container, ServiceScope};
pub use errors::CoreError;
pub use events::{Event, EventDispatcher};
pub use foundation::{Application, ApplicationBuilder, MemoryTranslator, Translator};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use providers::{
    FoundationServiceProvider, ProviderContext, ProviderError, ProviderSource, ProviderState,
    RegisteredProvider, ServiceProvider,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Framework information
pub const FRAMEWORK_NAME: &str = "strata";

/// Get framework version
pub fn version() -> &'static str {
    VERSION
}

use crate::container::scope::ServiceScope;
use crate::errors::CoreError;
use parking_lot::RwLock;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

/// Type-erased shared service value
pub type SharedService = Arc<dyn Any + Send + Sync>;

/// Factory producing a service from the container
pub type ServiceFactory = Arc<dyn Fn(&Container) -> Result<SharedService, CoreError> + Send + Sync>;

/// Service entry in the container
enum ServiceEntry {
    /// Resolved or pre-built instance
    Instance(SharedService),
    /// Factory invoked on resolution
    Factory {
        factory: ServiceFactory,
        scope: ServiceScope,
    },
}

impl std::fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceEntry::Instance(_) => f.debug_tuple("Instance").field(&"<instance>").finish(),
            ServiceEntry::Factory { scope, .. } => f
                .debug_struct("Factory")
                .field("scope", scope)
                .finish_non_exhaustive(),
        }
    }
}

/// A named factory binding, used for the static bindings providers declare
#[derive(Clone)]
pub struct Binding {
    id: String,
    factory: ServiceFactory,
    scope: ServiceScope,
}

impl Binding {
    /// A binding that builds a fresh value on every resolution
    pub fn transient<T, F>(id: impl Into<String>, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            factory: erase(factory),
            scope: ServiceScope::Transient,
        }
    }

    /// A binding whose value is built once and then shared
    pub fn singleton<T, F>(id: impl Into<String>, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            factory: erase(factory),
            scope: ServiceScope::Singleton,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn scope(&self) -> ServiceScope {
        self.scope
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

fn erase<T, F>(factory: F) -> ServiceFactory
where
    T: Any + Send + Sync,
    F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
{
    Arc::new(move |container: &Container| {
        factory(container).map(|value| Arc::new(value) as SharedService)
    })
}

/// String-keyed service container
#[derive(Debug, Default)]
pub struct Container {
    services: RwLock<HashMap<String, ServiceEntry>>,
    aliases: RwLock<HashMap<String, String>>,
}

impl Container {
    /// Create an empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a transient factory
    pub fn bind<T, F>(&self, id: impl Into<String>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        self.bind_binding(Binding::transient(id, factory));
    }

    /// Bind a factory resolved once and shared afterwards
    pub fn singleton<T, F>(&self, id: impl Into<String>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        self.bind_binding(Binding::singleton(id, factory));
    }

    /// Register a prepared binding, replacing any previous entry under the same id
    pub fn bind_binding(&self, binding: Binding) {
        tracing::debug!(service = %binding.id, scope = %binding.scope, "binding service");
        self.services.write().insert(
            binding.id,
            ServiceEntry::Factory {
                factory: binding.factory,
                scope: binding.scope,
            },
        );
    }

    /// Register an existing value
    pub fn instance<T>(&self, id: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.services
            .write()
            .insert(id.into(), ServiceEntry::Instance(Arc::new(value)));
    }

    /// Make `alias` resolve to `id`
    pub fn alias(&self, id: impl Into<String>, alias: impl Into<String>) -> Result<(), CoreError> {
        let id = id.into();
        let alias = alias.into();

        if id == alias {
            return Err(CoreError::InvalidAlias {
                message: "an alias cannot point at itself".to_string(),
                alias,
            });
        }

        self.aliases.write().insert(alias, id);
        Ok(())
    }

    /// Check whether a name is registered as an alias
    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.read().contains_key(name)
    }

    /// Follow alias chains to the canonical id
    pub fn canonical_id(&self, name: &str) -> Result<String, CoreError> {
        let aliases = self.aliases.read();
        let mut current = name;

        // A chain longer than the alias table must loop
        for _ in 0..=aliases.len() {
            match aliases.get(current) {
                Some(target) => current = target,
                None => return Ok(current.to_string()),
            }
        }

        Err(CoreError::InvalidAlias {
            alias: name.to_string(),
            message: "alias chain is circular".to_string(),
        })
    }

    /// Check whether a service (or alias of one) is bound
    pub fn has(&self, name: &str) -> bool {
        self.canonical_id(name)
            .map(|id| self.services.read().contains_key(&id))
            .unwrap_or(false)
    }

    /// Resolve the type-erased service bound under a name
    pub fn resolve(&self, name: &str) -> Result<SharedService, CoreError> {
        let id = self.canonical_id(name)?;

        let (factory, scope) = {
            let services = self.services.read();
            match services.get(&id) {
                Some(ServiceEntry::Instance(instance)) => return Ok(instance.clone()),
                Some(ServiceEntry::Factory { factory, scope }) => (factory.clone(), *scope),
                None => return Err(CoreError::service_not_found(id)),
            }
        };

        // The factory may resolve other services, so no lock is held while it runs
        let instance = factory(self)?;

        if scope.is_singleton() {
            let mut services = self.services.write();
            if let Some(ServiceEntry::Instance(existing)) = services.get(&id) {
                return Ok(existing.clone());
            }
            services.insert(id, ServiceEntry::Instance(instance.clone()));
        }

        Ok(instance)
    }

    /// Resolve a service and downcast it to `T`
    pub fn make<T>(&self, name: &str) -> Result<Arc<T>, CoreError>
    where
        T: Any + Send + Sync,
    {
        self.resolve(name)?
            .downcast::<T>()
            .map_err(|_| CoreError::ServiceTypeMismatch {
                service: name.to_string(),
                expected: type_name::<T>().to_string(),
            })
    }

    /// Alias of [`Container::make`] mirroring the PSR-style accessor
    pub fn get<T>(&self, name: &str) -> Result<Arc<T>, CoreError>
    where
        T: Any + Send + Sync,
    {
        self.make(name)
    }

    /// Number of bound services, aliases excluded
    pub fn service_count(&self) -> usize {
        self.services.read().len()
    }
}

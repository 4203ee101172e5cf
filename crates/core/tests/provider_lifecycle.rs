use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use strata_core::bootstrap::{BootProviders, Bootstrapper, RegisterProviders};
use strata_core::container::Binding;
use strata_core::{
    Application, FoundationServiceProvider, ProviderContext, ProviderError, ProviderState,
    Repository, ServiceProvider,
};

type Journal = Arc<Mutex<Vec<String>>>;

/// Provider recording every hook into a shared journal
struct JournalProvider {
    name: &'static str,
    journal: Journal,
    registrations: Arc<AtomicUsize>,
}

impl JournalProvider {
    fn new(name: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            journal: journal.clone(),
            registrations: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl ServiceProvider for JournalProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn register(&mut self, ctx: &ProviderContext<'_>) -> Result<(), ProviderError> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().push(format!("register:{}", self.name));

        let journal = self.journal.clone();
        let name = self.name;
        ctx.booting(move |_| {
            journal.lock().push(format!("booting:{}", name));
            Ok(())
        });

        let journal = self.journal.clone();
        ctx.booted(move |_| {
            journal.lock().push(format!("booted:{}", name));
            Ok(())
        });

        Ok(())
    }

    fn boot(&mut self, _ctx: &ProviderContext<'_>) -> Result<(), ProviderError> {
        self.journal.lock().push(format!("boot:{}", self.name));
        Ok(())
    }
}

struct FailingProvider;

impl ServiceProvider for FailingProvider {
    fn name(&self) -> &'static str {
        "FailingProvider"
    }

    fn register(&mut self, _ctx: &ProviderContext<'_>) -> Result<(), ProviderError> {
        Err(ProviderError::registration_failed("database unreachable"))
    }
}

struct CacheProvider;

impl ServiceProvider for CacheProvider {
    fn name(&self) -> &'static str {
        "CacheProvider"
    }

    fn register(&mut self, _ctx: &ProviderContext<'_>) -> Result<(), ProviderError> {
        Ok(())
    }

    fn bindings(&self) -> Vec<Binding> {
        vec![Binding::singleton("cache.driver", |_| Ok(String::from("memory")))]
    }
}

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn test_registering_twice_without_force_runs_register_once() {
    let app = Application::new("/srv/app");
    let journal = journal();
    let provider = JournalProvider::new("Mailer", &journal);
    let registrations = provider.registrations.clone();

    let first = app.register(provider, false).unwrap();
    let second = app
        .register(JournalProvider::new("Mailer", &journal), false)
        .unwrap();

    assert_eq!(registrations.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(*journal.lock(), vec!["register:Mailer"]);
}

#[test]
fn test_forced_registration_creates_a_fresh_instance() {
    let app = Application::new("/srv/app");
    let journal = journal();

    let first = app
        .register(JournalProvider::new("Mailer", &journal), false)
        .unwrap();
    let second = app
        .register(JournalProvider::new("Mailer", &journal), true)
        .unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first.state(), ProviderState::Registered);
    assert_eq!(second.state(), ProviderState::Registered);
    assert!(Arc::ptr_eq(&app.get_provider("Mailer").unwrap(), &second));
    assert_eq!(app.get_loaded_providers(), vec!["Mailer"]);
}

#[test]
fn test_boot_runs_callbacks_around_provider_boot() {
    let app = Application::new("/srv/app");
    let journal = journal();

    let log = journal.clone();
    app.booting(move |_| {
        log.lock().push("app:booting".to_string());
        Ok(())
    });
    let log = journal.clone();
    app.booted(move |_| {
        log.lock().push("app:booted".to_string());
        Ok(())
    })
    .unwrap();

    app.register(JournalProvider::new("Mailer", &journal), false)
        .unwrap();
    app.register(JournalProvider::new("Queue", &journal), false)
        .unwrap();
    app.boot().unwrap();

    assert_eq!(
        *journal.lock(),
        vec![
            "register:Mailer",
            "register:Queue",
            "app:booting",
            "booting:Mailer",
            "boot:Mailer",
            "booted:Mailer",
            "booting:Queue",
            "boot:Queue",
            "booted:Queue",
            "app:booted",
        ]
    );
    assert!(app.is_booted());
}

#[test]
fn test_boot_is_idempotent() {
    let app = Application::new("/srv/app");
    let journal = journal();
    app.register(JournalProvider::new("Mailer", &journal), false)
        .unwrap();

    app.boot().unwrap();
    app.boot().unwrap();

    let boots = journal
        .lock()
        .iter()
        .filter(|entry| entry.as_str() == "boot:Mailer")
        .count();
    assert_eq!(boots, 1);
}

#[test]
fn test_booted_callback_after_boot_runs_immediately() {
    let app = Application::new("/srv/app");
    app.boot().unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    app.booted(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);

    app.boot().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_registering_after_boot_boots_immediately() {
    let app = Application::new("/srv/app");
    let journal = journal();
    app.boot().unwrap();

    let provider = app
        .register(JournalProvider::new("Late", &journal), false)
        .unwrap();

    assert!(provider.is_booted());
    assert_eq!(
        *journal.lock(),
        vec!["register:Late", "booting:Late", "boot:Late", "booted:Late"]
    );
}

#[test]
fn test_failed_registration_is_not_recorded() {
    let app = Application::new("/srv/app");

    let error = app.register(FailingProvider, false).unwrap_err();

    assert_eq!(
        error.to_string(),
        "Provider registration failed: database unreachable"
    );
    assert!(!app.provider_is_loaded("FailingProvider"));
    assert!(app.get_provider("FailingProvider").is_none());
}

#[test]
fn test_providers_registered_while_booting_are_booted_in_the_same_pass() {
    let app = Application::new("/srv/app");
    let journal = journal();

    let late_journal = journal.clone();
    app.booting(move |app| {
        app.register(JournalProvider::new("Late", &late_journal), false)?;
        Ok(())
    });
    app.register(JournalProvider::new("Early", &journal), false)
        .unwrap();

    app.boot().unwrap();

    assert!(app.get_provider("Late").unwrap().is_booted());
    assert_eq!(app.get_loaded_providers(), vec!["Early", "Late"]);
}

#[test]
fn test_static_bindings_are_applied_after_register() {
    let app = Application::new("/srv/app");
    app.register(CacheProvider, false).unwrap();

    let driver = app.container().make::<String>("cache.driver").unwrap();
    assert_eq!(driver.as_str(), "memory");
}

#[test]
fn test_providers_are_found_by_concrete_type() {
    let app = Application::new("/srv/app");
    let journal = journal();
    app.register(JournalProvider::new("Mailer", &journal), false)
        .unwrap();
    app.register(CacheProvider, false).unwrap();

    let journals = app.get_providers::<JournalProvider>();
    assert_eq!(journals.len(), 1);
    assert_eq!(
        journals[0].with::<JournalProvider, _>(|provider| provider.name),
        Some("Mailer")
    );
    assert_eq!(app.get_providers::<CacheProvider>().len(), 1);
}

#[test]
fn test_providers_register_by_name_through_factories() {
    let app = Application::new("/srv/app");
    let journal = journal();

    let factory_journal = journal.clone();
    app.register_provider_factory("Mailer", move |_: &Application| -> Box<dyn ServiceProvider> {
        Box::new(JournalProvider::new("Mailer", &factory_journal))
    });

    app.register("Mailer", false).unwrap();
    assert!(app.provider_is_loaded("Mailer"));

    let error = app.register("Unknown", false).unwrap_err();
    assert!(matches!(error, ProviderError::UnknownProvider { .. }));
}

#[test]
fn test_bootstrap_announces_each_step() {
    let app = Application::builder()
        .base_path("/srv/app")
        .repository(Repository::from_value(json!({
            "app": { "providers": ["Mailer", "FoundationServiceProvider"] }
        })))
        .build();
    let journal = journal();

    let factory_journal = journal.clone();
    app.register_provider_factory("Mailer", move |_: &Application| -> Box<dyn ServiceProvider> {
        Box::new(JournalProvider::new("Mailer", &factory_journal))
    });

    let log = journal.clone();
    app.before_bootstrapping("RegisterProviders", move |_| {
        log.lock().push("before:RegisterProviders".to_string());
    });
    let log = journal.clone();
    app.after_bootstrapping("BootProviders", move |app| {
        log.lock().push(format!("after:BootProviders:{}", app.is_booted()));
    });

    let bootstrappers: Vec<Box<dyn Bootstrapper>> =
        vec![Box::new(RegisterProviders), Box::new(BootProviders)];
    app.bootstrap_with(&bootstrappers).unwrap();

    assert!(app.has_been_bootstrapped());
    assert_eq!(
        app.get_loaded_providers(),
        vec![FoundationServiceProvider::NAME, "Mailer"]
    );
    assert_eq!(app.repository().get_str("app_name").as_deref(), Some("strata"));
    assert_eq!(app.repository().get_str("app.timezone").as_deref(), Some("UTC"));

    let journal = journal.lock();
    assert_eq!(journal.first().map(String::as_str), Some("before:RegisterProviders"));
    assert_eq!(journal.last().map(String::as_str), Some("after:BootProviders:true"));
}

/// Looks providers up by type while it boots
struct CacheInspector {
    found: Arc<Mutex<Vec<usize>>>,
}

impl ServiceProvider for CacheInspector {
    fn name(&self) -> &'static str {
        "CacheInspector"
    }

    fn register(&mut self, _ctx: &ProviderContext<'_>) -> Result<(), ProviderError> {
        Ok(())
    }

    fn boot(&mut self, ctx: &ProviderContext<'_>) -> Result<(), ProviderError> {
        let app = ctx.app();
        self.found.lock().push(app.get_providers::<CacheProvider>().len());
        self.found.lock().push(app.get_providers::<CacheInspector>().len());
        Ok(())
    }
}

/// Force-registers a fresh `Mailer` from inside its own boot
struct MailerReplacer {
    journal: Journal,
}

impl ServiceProvider for MailerReplacer {
    fn name(&self) -> &'static str {
        "MailerReplacer"
    }

    fn register(&mut self, _ctx: &ProviderContext<'_>) -> Result<(), ProviderError> {
        Ok(())
    }

    fn boot(&mut self, ctx: &ProviderContext<'_>) -> Result<(), ProviderError> {
        ctx.app()
            .register(JournalProvider::new("Mailer", &self.journal), true)?;
        Ok(())
    }
}

#[test]
fn test_providers_can_be_looked_up_by_type_while_booting() {
    let app = Application::new("/srv/app");
    let found = Arc::new(Mutex::new(Vec::new()));

    app.register(CacheProvider, false).unwrap();
    app.register(CacheInspector { found: found.clone() }, false)
        .unwrap();
    app.boot().unwrap();

    assert_eq!(*found.lock(), vec![1, 1]);
    assert!(app.get_provider("CacheInspector").unwrap().is_booted());
}

#[test]
fn test_forced_replacement_during_boot_is_booted() {
    let app = Application::new("/srv/app");
    let journal = journal();

    let original = app
        .register(JournalProvider::new("Mailer", &journal), false)
        .unwrap();
    app.register(MailerReplacer { journal: journal.clone() }, false)
        .unwrap();
    app.boot().unwrap();

    let replacement = app.get_provider("Mailer").unwrap();
    assert!(!Arc::ptr_eq(&original, &replacement));
    assert!(original.is_booted());
    assert_eq!(replacement.state(), ProviderState::Booted);
    assert!(app
        .get_providers::<JournalProvider>()
        .iter()
        .all(|provider| provider.is_booted()));
    assert_eq!(
        journal
            .lock()
            .iter()
            .filter(|entry| entry.as_str() == "boot:Mailer")
            .count(),
        2
    );
}

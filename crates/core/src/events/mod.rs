//! # Events
//!
//! Minimal event dispatcher used for bootstrap phase announcements and
//! locale-change notification.

use crate::foundation::Application;
use parking_lot::RwLock;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// Events announced by the application
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Fired before a bootstrapper runs
    Bootstrapping(String),
    /// Fired after a bootstrapper ran
    Bootstrapped(String),
    /// Fired after the application locale changed
    LocaleUpdated { locale: String },
    /// Application-defined event
    Custom {
        name: String,
        payload: serde_json::Value,
    },
}

impl Event {
    /// Name listeners subscribe to
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            Event::Bootstrapping(bootstrapper) => Cow::Owned(bootstrapping_event(bootstrapper)),
            Event::Bootstrapped(bootstrapper) => Cow::Owned(bootstrapped_event(bootstrapper)),
            Event::LocaleUpdated { .. } => Cow::Borrowed(LOCALE_UPDATED),
            Event::Custom { name, .. } => Cow::Borrowed(name),
        }
    }
}

/// Name of the locale change event
pub const LOCALE_UPDATED: &str = "locale.updated";

/// Event name fired before the given bootstrapper
pub fn bootstrapping_event(bootstrapper: &str) -> String {
    format!("bootstrapping: {}", bootstrapper)
}

/// Event name fired after the given bootstrapper
pub fn bootstrapped_event(bootstrapper: &str) -> String {
    format!("bootstrapped: {}", bootstrapper)
}

/// Event listener
pub type Listener = Arc<dyn Fn(&Application, &Event) + Send + Sync>;

/// Dispatches events to listeners registered by name
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for an event name
    pub fn listen<F>(&self, event: impl Into<String>, listener: F)
    where
        F: Fn(&Application, &Event) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .entry(event.into())
            .or_default()
            .push(Arc::new(listener));
    }

    /// Check if anything listens for an event name
    pub fn has_listeners(&self, event: &str) -> bool {
        self.listeners
            .read()
            .get(event)
            .map(|listeners| !listeners.is_empty())
            .unwrap_or(false)
    }

    /// Invoke every listener of the event in registration order
    pub fn dispatch(&self, app: &Application, event: &Event) {
        let name = event.name();
        // Listeners may register more listeners, so run them outside the lock
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .get(name.as_ref())
            .cloned()
            .unwrap_or_default();

        tracing::trace!(event = %name, listeners = listeners.len(), "dispatching event");

        for listener in listeners {
            listener(app, event);
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.read();
        f.debug_struct("EventDispatcher")
            .field("events", &listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}

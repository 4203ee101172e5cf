use parking_lot::RwLock;

/// Locale holder consumed by the application's locale accessors
pub trait Translator: Send + Sync {
    /// Current locale
    fn locale(&self) -> String;

    /// Replace the current locale
    fn set_locale(&self, locale: &str);

    /// Locale used when a translation is missing
    fn fallback(&self) -> String;
}

/// Translator keeping only locale state, bound by default as `translator`
#[derive(Debug)]
pub struct MemoryTranslator {
    locale: RwLock<String>,
    fallback: String,
}

impl MemoryTranslator {
    pub fn new(locale: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            locale: RwLock::new(locale.into()),
            fallback: fallback.into(),
        }
    }
}

impl Translator for MemoryTranslator {
    fn locale(&self) -> String {
        self.locale.read().clone()
    }

    fn set_locale(&self, locale: &str) {
        *self.locale.write() = locale.to_string();
    }

    fn fallback(&self) -> String {
        self.fallback.clone()
    }
}

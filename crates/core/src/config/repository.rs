//! Dot-notation configuration repository.
//!
//! Keys like `app.providers` walk nested JSON objects. The repository is shared
//! between providers and bootstrappers, so it is safe to use from several threads.

use crate::config::ConfigError;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Configuration collaborator consumed by the application and its providers
pub trait ConfigRepository: Send + Sync {
    /// Get the value at a dot-notation key
    fn get(&self, key: &str) -> Option<Value>;

    /// Set the value at a dot-notation key, creating intermediate objects
    fn set(&self, key: &str, value: Value) -> Result<(), ConfigError>;

    /// Check whether a key is present
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Get the value at a key or the given default
    fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }
}

impl dyn ConfigRepository {
    /// Get and deserialize the value at a key
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Get a string value, ignoring values of other types
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(Value::String(value)) => Some(value),
            _ => None,
        }
    }
}

/// In-memory configuration repository backed by a JSON tree
#[derive(Debug, Default)]
pub struct Repository {
    items: RwLock<Map<String, Value>>,
}

impl Repository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository from a JSON value; non-object values yield an empty repository
    pub fn from_value(value: Value) -> Self {
        let items = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Self {
            items: RwLock::new(items),
        }
    }

    /// Parse a JSON document into a repository
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_value(serde_json::from_str(source)?))
    }

    /// Parse a YAML document into a repository
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_value(serde_yaml::from_str(source)?))
    }

    /// Snapshot of every item
    pub fn all(&self) -> Value {
        Value::Object(self.items.read().clone())
    }
}

impl ConfigRepository for Repository {
    fn get(&self, key: &str) -> Option<Value> {
        let items = self.items.read();
        let mut segments = key.split('.');
        let mut current = items.get(segments.next()?)?;

        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }

        Some(current.clone())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), ConfigError> {
        let mut items = self.items.write();
        let segments: Vec<&str> = key.split('.').collect();
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| ConfigError::missing_required("key", "configuration key must not be empty"))?;

        let mut current = &mut *items;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));

            if entry.is_null() {
                *entry = Value::Object(Map::new());
            }

            current = entry
                .as_object_mut()
                .ok_or_else(|| ConfigError::NotAnObject {
                    key: key.to_string(),
                    segment: segment.to_string(),
                })?;
        }

        current.insert(last.to_string(), value);
        Ok(())
    }
}

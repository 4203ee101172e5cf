use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Server name used when a kernel configuration does not name one
pub const DEFAULT_SERVER: &str = "http";

/// Middleware configuration of one server's kernel.
///
/// Loaded from the `http.kernels` configuration entry, e.g.
///
/// ```yaml
/// http:
///   kernels:
///     http:
///       middleware: [TrimStrings]
///       groups:
///         web: [StartSession, auth]
///       aliases:
///         auth: "Authenticate:web"
///       priority: [StartSession, Authenticate]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub server: String,
    /// Global middleware applied to every request
    pub middleware: Vec<String>,
    pub groups: IndexMap<String, Vec<String>>,
    pub aliases: HashMap<String, String>,
    pub priority: Vec<String>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            middleware: Vec::new(),
            groups: IndexMap::new(),
            aliases: HashMap::new(),
            priority: Vec::new(),
        }
    }
}

impl KernelConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Self::default()
        }
    }

    pub fn with_middleware<I, S>(mut self, middleware: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware = middleware.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_group<I, S>(mut self, group: impl Into<String>, middleware: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .insert(group.into(), middleware.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), target.into());
        self
    }

    pub fn with_priority<I, S>(mut self, priority: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.priority = priority.into_iter().map(Into::into).collect();
        self
    }
}

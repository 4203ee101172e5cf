use crate::routing::HttpMethod;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Middleware descriptors attached to routes, keyed by `(server, route, method)`.
///
/// The kernel consults one source for route middleware and another for route
/// exclusions, and only when a route matched.
pub trait RouteMiddlewareSource: Send + Sync {
    fn middleware_for(&self, server: &str, route: &str, method: HttpMethod) -> Vec<String>;
}

type RouteKey = (String, String, HttpMethod);

/// In-memory [`RouteMiddlewareSource`] filled by the router
#[derive(Debug, Default)]
pub struct RouteMiddlewareTable {
    entries: RwLock<HashMap<RouteKey, Vec<String>>>,
}

impl RouteMiddlewareTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append descriptors to a route, skipping ones already attached
    pub fn add<I, S>(&self, server: &str, route: &str, method: HttpMethod, middleware: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries = self.entries.write();
        let attached = entries
            .entry((server.to_string(), route.to_string(), method))
            .or_default();

        for descriptor in middleware {
            let descriptor = descriptor.into();
            if !attached.contains(&descriptor) {
                attached.push(descriptor);
            }
        }
    }

    pub fn get(&self, server: &str, route: &str, method: HttpMethod) -> Vec<String> {
        self.entries
            .read()
            .get(&(server.to_string(), route.to_string(), method))
            .cloned()
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl RouteMiddlewareSource for RouteMiddlewareTable {
    fn middleware_for(&self, server: &str, route: &str, method: HttpMethod) -> Vec<String> {
        self.get(server, route, method)
    }
}

//! # HTTP Kernel
//!
//! Holds one server's middleware configuration (global stack, groups, aliases
//! and priority list) and resolves the ordered middleware for a dispatched
//! request. Resolutions are cached per route and method; every configuration
//! change drops the whole cache.

use crate::config::KernelConfig;
use crate::errors::{MiddlewareError, MiddlewareResult};
use crate::middleware::parsed::{with_parameters, PARAMETER_SEPARATOR};
use crate::middleware::priority::{insert_relative, sort_by_priority};
use crate::middleware::table::{RouteMiddlewareSource, RouteMiddlewareTable};
use crate::middleware::ParsedMiddleware;
use crate::routing::{Dispatched, HttpMethod};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock, RwLockUpgradableReadGuard};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Ordered middleware resolved for a request, shared with the cache
pub type ResolvedMiddleware = Arc<Vec<Arc<ParsedMiddleware>>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Route { route: String, method: HttpMethod },
    NoRoute,
}

impl From<&Dispatched> for CacheKey {
    fn from(dispatched: &Dispatched) -> Self {
        match dispatched {
            Dispatched::Found { route, method } => CacheKey::Route {
                route: route.clone(),
                method: *method,
            },
            Dispatched::NotFound => CacheKey::NoRoute,
        }
    }
}

/// Configuration tables and the resolution cache, guarded together so a
/// cleared cache is never refilled from stale tables
#[derive(Debug, Default)]
struct KernelState {
    middleware: Vec<String>,
    groups: IndexMap<String, Vec<String>>,
    aliases: HashMap<String, String>,
    priority: Vec<String>,
    cache: HashMap<CacheKey, ResolvedMiddleware>,
}

impl KernelState {
    fn invalidate(&mut self) {
        if !self.cache.is_empty() {
            tracing::debug!(entries = self.cache.len(), "clearing resolved middleware cache");
        }
        self.cache.clear();
    }
}

/// Middleware resolver for one server
pub struct HttpKernel {
    server: String,
    state: RwLock<KernelState>,
    parsed: Mutex<HashMap<String, Arc<ParsedMiddleware>>>,
    route_middleware: Arc<dyn RouteMiddlewareSource>,
    route_exclusions: Arc<dyn RouteMiddlewareSource>,
}

impl HttpKernel {
    /// Create a kernel with empty configuration and no route middleware
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            state: RwLock::new(KernelState::default()),
            parsed: Mutex::new(HashMap::new()),
            route_middleware: Arc::new(RouteMiddlewareTable::new()),
            route_exclusions: Arc::new(RouteMiddlewareTable::new()),
        }
    }

    pub fn from_config(config: KernelConfig) -> Self {
        let kernel = Self::new(config.server);
        {
            let mut state = kernel.state.write();
            state.middleware = config.middleware;
            state.groups = config.groups;
            state.aliases = config.aliases;
            state.priority = config.priority;
        }
        kernel
    }

    /// Source of the middleware routes register
    pub fn with_route_middleware(mut self, source: Arc<dyn RouteMiddlewareSource>) -> Self {
        self.route_middleware = source;
        self
    }

    /// Source of the middleware routes exclude
    pub fn with_route_exclusions(mut self, source: Arc<dyn RouteMiddlewareSource>) -> Self {
        self.route_exclusions = source;
        self
    }

    pub fn server_name(&self) -> &str {
        &self.server
    }

    /// Resolve the middleware for a dispatched request.
    ///
    /// Global middleware always applies; route middleware and route exclusions
    /// only when a route matched. The result is cached per route and method, or
    /// under a single entry for unmatched requests. Route sources are consulted
    /// on a cache miss only, while the kernel's configuration is locked, so they
    /// must not call back into the kernel.
    pub fn resolve_for_request(&self, dispatched: &Dispatched) -> MiddlewareResult<ResolvedMiddleware> {
        let key = CacheKey::from(dispatched);

        if let Some(cached) = self.state.read().cache.get(&key) {
            return Ok(cached.clone());
        }

        let state = self.state.upgradable_read();
        if let Some(cached) = state.cache.get(&key) {
            return Ok(cached.clone());
        }

        let (registered, excluded) = match dispatched {
            Dispatched::Found { route, method } => (
                self.route_middleware
                    .middleware_for(&self.server, route, *method),
                self.route_exclusions
                    .middleware_for(&self.server, route, *method),
            ),
            Dispatched::NotFound => (Vec::new(), Vec::new()),
        };

        let mut middleware =
            self.resolve_middleware(&state, state.middleware.iter().chain(&registered), &excluded)?;
        sort_by_priority(&mut middleware, &state.priority);

        tracing::debug!(
            server = %self.server,
            route = dispatched.route().unwrap_or("none"),
            middleware = middleware.len(),
            "resolved middleware"
        );

        let resolved = Arc::new(middleware);
        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        state.cache.insert(key, resolved.clone());

        Ok(resolved)
    }

    /// Expand aliases and groups, collapse duplicate signatures, apply exclusions
    fn resolve_middleware<'a>(
        &self,
        state: &KernelState,
        descriptors: impl Iterator<Item = &'a String>,
        excluded: &[String],
    ) -> MiddlewareResult<Vec<Arc<ParsedMiddleware>>> {
        // Position of a signature is fixed by its first insertion, its value by the last
        let mut resolved: IndexMap<String, Arc<ParsedMiddleware>> = IndexMap::new();

        for descriptor in descriptors {
            let parsed = self.parse_middleware(descriptor, &[]);

            if let Some(target) = state.aliases.get(parsed.name()) {
                let target = self.parse_middleware(target, parsed.parameters());
                resolved.insert(parsed.signature().to_string(), target);
                continue;
            }

            if let Some(group) = state.groups.get(parsed.name()) {
                for member in group {
                    let mut member = self.parse_middleware(member, &[]);
                    if let Some(target) = state.aliases.get(member.name()) {
                        member = self.parse_middleware(target, member.parameters());
                    }
                    resolved.insert(member.signature().to_string(), member);
                }
                continue;
            }

            resolved.insert(parsed.signature().to_string(), parsed);
        }

        if !excluded.is_empty() {
            let excluded = Self::expand_excluded(state, excluded)?;
            resolved.retain(|_, middleware| !excluded.contains(middleware.name()));
        }

        Ok(resolved.into_values().collect())
    }

    /// Names removed by route exclusions: aliases resolve to their target's
    /// name, groups to the names of their members
    fn expand_excluded(state: &KernelState, excluded: &[String]) -> MiddlewareResult<HashSet<String>> {
        let mut names = HashSet::new();

        for descriptor in excluded {
            if descriptor.contains(PARAMETER_SEPARATOR) {
                return Err(MiddlewareError::invalid_exclusion(descriptor.as_str()));
            }

            if let Some(target) = state.aliases.get(descriptor) {
                names.insert(name_of(target).to_string());
                continue;
            }

            if let Some(group) = state.groups.get(descriptor) {
                for member in group {
                    let name = name_of(member);
                    let name = state.aliases.get(name).map_or(name, |target| name_of(target));
                    names.insert(name.to_string());
                }
                continue;
            }

            names.insert(descriptor.clone());
        }

        Ok(names)
    }

    /// Parse a descriptor, appending `parameters` first; parses are cached by
    /// the full descriptor
    pub fn parse_middleware(&self, descriptor: &str, parameters: &[String]) -> Arc<ParsedMiddleware> {
        let descriptor = with_parameters(descriptor, parameters);
        let mut parsed = self.parsed.lock();

        if let Some(cached) = parsed.get(&descriptor) {
            return cached.clone();
        }

        let middleware = Arc::new(ParsedMiddleware::parse(&descriptor));
        parsed.insert(descriptor, middleware.clone());
        middleware
    }

    /// Number of cached resolutions
    pub fn cached_entries(&self) -> usize {
        self.state.read().cache.len()
    }

    /// Drop every cached resolution
    pub fn flush_cache(&self) {
        self.state.write().invalidate();
    }

    fn mutate<R>(&self, change: impl FnOnce(&mut KernelState) -> R) -> R {
        let mut state = self.state.write();
        let result = change(&mut state);
        state.invalidate();
        result
    }

    // Global middleware

    pub fn has_middleware(&self, middleware: &str) -> bool {
        self.state.read().middleware.iter().any(|m| m == middleware)
    }

    /// Add a middleware to the front of the global stack unless present
    pub fn prepend_middleware(&self, middleware: &str) -> &Self {
        self.mutate(|state| {
            if !state.middleware.iter().any(|m| m == middleware) {
                state.middleware.insert(0, middleware.to_string());
            }
        });
        tracing::debug!(server = %self.server, middleware, "prepended global middleware");
        self
    }

    /// Add a middleware to the end of the global stack unless present
    pub fn push_middleware(&self, middleware: &str) -> &Self {
        self.mutate(|state| {
            if !state.middleware.iter().any(|m| m == middleware) {
                state.middleware.push(middleware.to_string());
            }
        });
        tracing::debug!(server = %self.server, middleware, "pushed global middleware");
        self
    }

    pub fn get_global_middleware(&self) -> Vec<String> {
        self.state.read().middleware.clone()
    }

    pub fn set_global_middleware<I, S>(&self, middleware: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let middleware: Vec<String> = middleware.into_iter().map(Into::into).collect();
        self.mutate(|state| state.middleware = middleware);
        self
    }

    // Groups

    /// Add a middleware to the front of a group unless present
    pub fn prepend_middleware_to_group(&self, group: &str, middleware: &str) -> MiddlewareResult<&Self> {
        self.mutate(|state| -> MiddlewareResult<()> {
            let members = state
                .groups
                .get_mut(group)
                .ok_or_else(|| MiddlewareError::unknown_group(group))?;

            if !members.iter().any(|m| m == middleware) {
                members.insert(0, middleware.to_string());
            }
            Ok(())
        })?;
        Ok(self)
    }

    /// Add a middleware to the end of a group unless present
    pub fn append_middleware_to_group(&self, group: &str, middleware: &str) -> MiddlewareResult<&Self> {
        self.mutate(|state| -> MiddlewareResult<()> {
            let members = state
                .groups
                .get_mut(group)
                .ok_or_else(|| MiddlewareError::unknown_group(group))?;

            if !members.iter().any(|m| m == middleware) {
                members.push(middleware.to_string());
            }
            Ok(())
        })?;
        Ok(self)
    }

    pub fn get_middleware_groups(&self) -> IndexMap<String, Vec<String>> {
        self.state.read().groups.clone()
    }

    pub fn set_middleware_groups(&self, groups: IndexMap<String, Vec<String>>) -> &Self {
        self.mutate(|state| state.groups = groups);
        self
    }

    /// Append members to a group, creating the group if needed
    pub fn add_middleware_group<I, S>(&self, group: &str, middleware: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let middleware: Vec<String> = middleware.into_iter().map(Into::into).collect();
        self.mutate(|state| {
            state
                .groups
                .entry(group.to_string())
                .or_default()
                .extend(middleware)
        });
        self
    }

    // Aliases

    pub fn get_middleware_aliases(&self) -> HashMap<String, String> {
        self.state.read().aliases.clone()
    }

    pub fn set_middleware_aliases<I, K, V>(&self, aliases: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let aliases: HashMap<String, String> = aliases
            .into_iter()
            .map(|(alias, target)| (alias.into(), target.into()))
            .collect();
        self.mutate(|state| state.aliases = aliases);
        self
    }

    // Priority

    pub fn get_middleware_priority(&self) -> Vec<String> {
        self.state.read().priority.clone()
    }

    pub fn set_middleware_priority<I, S>(&self, priority: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let priority: Vec<String> = priority.into_iter().map(Into::into).collect();
        self.mutate(|state| state.priority = priority);
        self
    }

    pub fn prepend_to_middleware_priority(&self, middleware: &str) -> &Self {
        self.mutate(|state| {
            if !state.priority.iter().any(|m| m == middleware) {
                state.priority.insert(0, middleware.to_string());
            }
        });
        self
    }

    pub fn append_to_middleware_priority(&self, middleware: &str) -> &Self {
        self.mutate(|state| {
            if !state.priority.iter().any(|m| m == middleware) {
                state.priority.push(middleware.to_string());
            }
        });
        self
    }

    /// Insert into the priority list ahead of the earliest listed anchor
    pub fn add_to_middleware_priority_before(&self, anchors: &[&str], middleware: &str) -> &Self {
        self.mutate(|state| insert_relative(&mut state.priority, anchors, middleware, false));
        self
    }

    /// Insert into the priority list behind the furthest listed anchor
    pub fn add_to_middleware_priority_after(&self, anchors: &[&str], middleware: &str) -> &Self {
        self.mutate(|state| insert_relative(&mut state.priority, anchors, middleware, true));
        self
    }
}

impl std::fmt::Debug for HttpKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("HttpKernel")
            .field("server", &self.server)
            .field("middleware", &state.middleware)
            .field("groups", &state.groups.keys().collect::<Vec<_>>())
            .field("priority", &state.priority)
            .field("cached", &state.cache.len())
            .finish()
    }
}

fn name_of(descriptor: &str) -> &str {
    descriptor
        .split_once(PARAMETER_SEPARATOR)
        .map_or(descriptor, |(name, _)| name)
}

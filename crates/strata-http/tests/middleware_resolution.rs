use indexmap::IndexMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use strata_http::{
    Dispatched, HttpKernel, HttpMethod, KernelConfig, MiddlewareError, ResolvedMiddleware,
    RouteMiddlewareSource, RouteMiddlewareTable,
};

/// Route source counting how often the kernel asks it for middleware
struct SpySource {
    middleware: Vec<String>,
    calls: AtomicUsize,
}

impl SpySource {
    fn new(middleware: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            middleware: middleware.iter().map(|m| m.to_string()).collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RouteMiddlewareSource for SpySource {
    fn middleware_for(&self, _server: &str, _route: &str, _method: HttpMethod) -> Vec<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.middleware.clone()
    }
}

fn signatures(resolved: &ResolvedMiddleware) -> Vec<String> {
    resolved.iter().map(|m| m.signature().to_string()).collect()
}

fn route() -> Dispatched {
    Dispatched::found("/users", HttpMethod::GET)
}

fn group(name: &str, members: &[&str]) -> IndexMap<String, Vec<String>> {
    IndexMap::from([(
        name.to_string(),
        members.iter().map(|m| m.to_string()).collect(),
    )])
}

fn kernel_excluding(exclusions: &[&str]) -> HttpKernel {
    let table = Arc::new(RouteMiddlewareTable::new());
    table.add("http", "/users", HttpMethod::GET, exclusions.iter().copied());
    HttpKernel::new("http").with_route_exclusions(table)
}

#[test]
fn test_cached_resolution_skips_expansion() {
    let spy = SpySource::new(&["auth"]);
    let kernel = HttpKernel::new("http").with_route_middleware(spy.clone());
    kernel.set_global_middleware(["TrimStrings"]);

    let first = kernel.resolve_for_request(&route()).unwrap();
    let second = kernel.resolve_for_request(&route()).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(spy.calls(), 1);
    assert_eq!(signatures(&first), vec!["TrimStrings", "auth"]);
}

#[test]
fn test_different_methods_are_cached_separately() {
    let spy = SpySource::new(&[]);
    let kernel = HttpKernel::new("http").with_route_middleware(spy.clone());

    kernel.resolve_for_request(&route()).unwrap();
    kernel
        .resolve_for_request(&Dispatched::found("/users", HttpMethod::POST))
        .unwrap();

    assert_eq!(spy.calls(), 2);
    assert_eq!(kernel.cached_entries(), 2);
}

#[test]
fn test_unmatched_requests_never_consult_route_sources() {
    let spy = SpySource::new(&["auth"]);
    let kernel = HttpKernel::new("http").with_route_middleware(spy.clone());

    let resolved = kernel.resolve_for_request(&Dispatched::not_found()).unwrap();

    assert!(resolved.is_empty());
    assert_eq!(spy.calls(), 0);
}

#[test]
fn test_duplicates_collapse_to_first_position() {
    let kernel = HttpKernel::new("http");
    kernel.set_global_middleware(["A", "B", "A"]);

    let resolved = kernel.resolve_for_request(&Dispatched::not_found()).unwrap();

    assert_eq!(signatures(&resolved), vec!["A", "B"]);
}

#[test]
fn test_alias_substitutes_target_with_parameters() {
    let kernel = HttpKernel::new("http");
    kernel
        .set_middleware_aliases([("admin", "auth:admin")])
        .set_global_middleware(["admin"]);

    let resolved = kernel.resolve_for_request(&Dispatched::not_found()).unwrap();

    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].name(), "auth");
    assert_eq!(resolved[0].parameters(), ["admin"]);
}

#[test]
fn test_group_members_resolve_aliases_in_order() {
    let kernel = HttpKernel::new("http");
    kernel
        .set_middleware_groups(group("web", &["alias1", "RawMw"]))
        .set_middleware_aliases([("alias1", "RealMw")])
        .set_global_middleware(["web"]);

    let resolved = kernel.resolve_for_request(&Dispatched::not_found()).unwrap();

    assert_eq!(signatures(&resolved), vec!["RealMw", "RawMw"]);
}

#[test]
fn test_parameterized_exclusion_is_rejected() {
    let kernel = kernel_excluding(&["auth:admin"]);
    kernel.set_global_middleware(["auth"]);

    let error = kernel.resolve_for_request(&route()).unwrap_err();

    assert_eq!(
        error,
        MiddlewareError::InvalidExclusion {
            middleware: "auth:admin".to_string()
        }
    );
    assert_eq!(kernel.cached_entries(), 0);
}

#[test]
fn test_excluding_a_group_removes_its_members() {
    let kernel = kernel_excluding(&["web"]);
    kernel
        .set_middleware_groups(group("web", &["X", "Y"]))
        .set_global_middleware(["web"]);

    let resolved = kernel.resolve_for_request(&route()).unwrap();

    assert!(resolved.is_empty());
}

#[test]
fn test_exclusions_remove_every_parameterized_instance() {
    let kernel = kernel_excluding(&["throttle"]);
    kernel.set_global_middleware(["throttle:60,1", "Cors", "throttle:10"]);

    let resolved = kernel.resolve_for_request(&route()).unwrap();

    assert_eq!(signatures(&resolved), vec!["Cors"]);
}

#[test]
fn test_priority_list_reorders_listed_middleware() {
    let kernel = HttpKernel::new("http");
    kernel
        .set_middleware_priority(["Auth", "Throttle", "Verify"])
        .set_global_middleware(["Verify", "Auth", "Throttle"]);

    let resolved = kernel.resolve_for_request(&Dispatched::not_found()).unwrap();

    assert_eq!(signatures(&resolved), vec!["Auth", "Throttle", "Verify"]);
}

#[test]
fn test_priority_keeps_unlisted_neighbours_together() {
    let kernel = HttpKernel::new("http");
    kernel
        .set_middleware_priority(["Auth", "Verify"])
        .set_global_middleware(["Cors", "Verify", "Trim", "Auth"]);

    let resolved = kernel.resolve_for_request(&Dispatched::not_found()).unwrap();

    assert_eq!(signatures(&resolved), vec!["Cors", "Auth", "Verify", "Trim"]);
}

#[test]
fn test_pushing_middleware_invalidates_the_cache() {
    let kernel = HttpKernel::new("http");
    kernel.set_global_middleware(["A"]);

    let before = kernel.resolve_for_request(&route()).unwrap();
    kernel.push_middleware("B");
    let after = kernel.resolve_for_request(&route()).unwrap();

    assert_eq!(signatures(&before), vec!["A"]);
    assert_eq!(signatures(&after), vec!["A", "B"]);
}

#[test]
fn test_every_mutator_clears_the_cache() {
    let kernel = HttpKernel::new("http");
    kernel.add_middleware_group("web", ["Session"]);

    let mutations: Vec<Box<dyn Fn(&HttpKernel)>> = vec![
        Box::new(|k: &HttpKernel| {
            k.prepend_middleware("First");
        }),
        Box::new(|k: &HttpKernel| {
            k.push_middleware("Last");
        }),
        Box::new(|k: &HttpKernel| {
            k.prepend_middleware_to_group("web", "Cookies").unwrap();
        }),
        Box::new(|k: &HttpKernel| {
            k.append_middleware_to_group("web", "Csrf").unwrap();
        }),
        Box::new(|k: &HttpKernel| {
            k.add_middleware_group("api", ["Throttle"]);
        }),
        Box::new(|k: &HttpKernel| {
            k.set_middleware_aliases([("auth", "Authenticate")]);
        }),
        Box::new(|k: &HttpKernel| {
            k.prepend_to_middleware_priority("Session");
        }),
        Box::new(|k: &HttpKernel| {
            k.append_to_middleware_priority("Csrf");
        }),
        Box::new(|k: &HttpKernel| {
            k.add_to_middleware_priority_before(&["Csrf"], "Cookies");
        }),
        Box::new(|k: &HttpKernel| {
            k.add_to_middleware_priority_after(&["Session"], "Auth");
        }),
    ];

    for mutate in mutations {
        kernel.resolve_for_request(&route()).unwrap();
        assert_eq!(kernel.cached_entries(), 1);

        mutate(&kernel);
        assert_eq!(kernel.cached_entries(), 0);
    }

    assert_eq!(kernel.get_global_middleware(), vec!["First", "Last"]);
    assert_eq!(
        kernel.get_middleware_groups().get("web"),
        Some(&vec![
            "Cookies".to_string(),
            "Session".to_string(),
            "Csrf".to_string()
        ])
    );
    assert_eq!(
        kernel.get_middleware_priority(),
        vec!["Session", "Auth", "Cookies", "Csrf"]
    );
}

#[test]
fn test_mutators_do_not_insert_duplicates() {
    let kernel = HttpKernel::new("http");
    kernel
        .push_middleware("A")
        .push_middleware("A")
        .prepend_middleware("A")
        .append_to_middleware_priority("A")
        .prepend_to_middleware_priority("A");

    assert_eq!(kernel.get_global_middleware(), vec!["A"]);
    assert_eq!(kernel.get_middleware_priority(), vec!["A"]);
    assert!(kernel.has_middleware("A"));
    assert!(!kernel.has_middleware("B"));
}

#[test]
fn test_unknown_group_is_rejected() {
    let kernel = HttpKernel::new("http");

    let error = kernel
        .append_middleware_to_group("missing", "Auth")
        .unwrap_err();

    assert_eq!(
        error.to_string(),
        "The [missing] middleware group has not been defined."
    );
    assert!(matches!(
        kernel.prepend_middleware_to_group("missing", "Auth"),
        Err(MiddlewareError::UnknownGroup { .. })
    ));
}

#[test]
fn test_kernel_from_config_resolves_route_groups() {
    let config: KernelConfig = serde_yaml::from_str(
        r#"
server: http
middleware: [TrimStrings]
groups:
  web: [StartSession, auth]
aliases:
  auth: "Authenticate:web"
priority: [Authenticate, StartSession]
"#,
    )
    .unwrap();

    let routes = Arc::new(RouteMiddlewareTable::new());
    routes.add("http", "/users", HttpMethod::GET, ["web", "throttle:60"]);

    let kernel = HttpKernel::from_config(config).with_route_middleware(routes);
    let resolved = kernel.resolve_for_request(&route()).unwrap();

    assert_eq!(
        signatures(&resolved),
        vec!["TrimStrings", "Authenticate:web", "StartSession", "throttle:60"]
    );
    assert_eq!(kernel.server_name(), "http");
}

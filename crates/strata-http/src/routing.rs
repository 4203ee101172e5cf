//! Route dispatch results consumed by the kernel.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP methods supported by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
    TRACE,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::TRACE => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown method name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::GET),
            "POST" => Ok(HttpMethod::POST),
            "PUT" => Ok(HttpMethod::PUT),
            "DELETE" => Ok(HttpMethod::DELETE),
            "PATCH" => Ok(HttpMethod::PATCH),
            "HEAD" => Ok(HttpMethod::HEAD),
            "OPTIONS" => Ok(HttpMethod::OPTIONS),
            "TRACE" => Ok(HttpMethod::TRACE),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// Outcome of matching a request against the route table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Found { route: String, method: HttpMethod },
    NotFound,
}

impl Dispatched {
    pub fn found(route: impl Into<String>, method: HttpMethod) -> Self {
        Dispatched::Found {
            route: route.into(),
            method,
        }
    }

    pub fn not_found() -> Self {
        Dispatched::NotFound
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Dispatched::Found { .. })
    }

    /// Route identifier of a matched route
    pub fn route(&self) -> Option<&str> {
        match self {
            Dispatched::Found { route, .. } => Some(route),
            Dispatched::NotFound => None,
        }
    }

    pub fn method(&self) -> Option<HttpMethod> {
        match self {
            Dispatched::Found { method, .. } => Some(*method),
            Dispatched::NotFound => None,
        }
    }
}

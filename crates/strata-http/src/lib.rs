//! # strata-http
//!
//! HTTP kernel for the strata framework: resolves, deduplicates and orders the
//! middleware that runs for each dispatched request.

pub mod config;
pub mod errors;
pub mod middleware;
pub mod provider;
pub mod routing;

pub use config::KernelConfig;
pub use errors::{MiddlewareError, MiddlewareResult};
pub use middleware::{
    HttpKernel, ParsedMiddleware, ResolvedMiddleware, RouteMiddlewareSource, RouteMiddlewareTable,
};
pub use provider::HttpServiceProvider;
pub use routing::{Dispatched, HttpMethod};

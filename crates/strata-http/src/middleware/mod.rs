//! # Middleware
//!
//! Descriptor parsing, per-server resolution and priority ordering.

pub mod kernel;
pub mod parsed;
pub mod priority;
pub mod table;

pub use kernel::{HttpKernel, ResolvedMiddleware};
pub use parsed::ParsedMiddleware;
pub use priority::{insert_relative, sort_by_priority, Prioritized};
pub use table::{RouteMiddlewareSource, RouteMiddlewareTable};

#[allow(clippy::module_inception)]
pub mod container;
pub mod scope;

pub use container::{Binding, Container, ServiceFactory, SharedService};
pub use scope::ServiceScope;

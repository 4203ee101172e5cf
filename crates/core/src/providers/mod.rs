pub mod foundation;
pub mod provider;
pub mod registry;

pub use foundation::*;
pub use provider::*;
pub use registry::*;

//! # Foundation
//!
//! The [`Application`] with its provider lifecycle, path and environment
//! accessors, plus the locale translator it delegates to.

pub mod application;
pub mod paths;
pub mod translator;

pub use application::{Application, ApplicationBuilder};
pub use paths::join_paths;
pub use translator::{MemoryTranslator, Translator};

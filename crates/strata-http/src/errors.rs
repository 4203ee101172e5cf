use thiserror::Error;

/// Middleware configuration and resolution errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MiddlewareError {
    /// Exclusions name whole middleware, never a parameterized instance
    #[error("Middleware exclusions may not contain parameters: [{middleware}]")]
    InvalidExclusion { middleware: String },

    #[error("The [{group}] middleware group has not been defined.")]
    UnknownGroup { group: String },
}

impl MiddlewareError {
    pub fn invalid_exclusion(middleware: impl Into<String>) -> Self {
        Self::InvalidExclusion {
            middleware: middleware.into(),
        }
    }

    pub fn unknown_group(group: impl Into<String>) -> Self {
        Self::UnknownGroup {
            group: group.into(),
        }
    }
}

/// Result type for middleware operations
pub type MiddlewareResult<T> = Result<T, MiddlewareError>;

//! Tag registry error types

use thiserror::Error;

/// Errors raised while resolving, creating or aliasing tags
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The name normalizes to nothing or names a pseudo-tag
    #[error("Invalid tag name: '{0}'")]
    InvalidName(String),

    /// A user-entered tag uses reserved characters
    #[error("Invalid tag format: {0}")]
    InvalidTag(String),

    /// Alias already exists
    #[error("Alias '{0}' already exists for '{1}'")]
    AliasExists(String, String),

    /// The alias target is itself an alias
    #[error("'{0}' is an alias of '{1}' and cannot be an alias target")]
    AliasChain(String, String),

    /// Circular alias reference detected
    #[error("Circular alias detected: {0}")]
    CircularAlias(String),

    /// Alias not defined
    #[error("Alias '{0}' not found")]
    AliasNotFound(String),

    /// The backing store failed
    #[error("Tag storage error: {0}")]
    Backend(String),
}

/// Type alias for cleaner function signatures
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;

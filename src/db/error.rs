//! Database-specific error types
//!
//! # Error Types
//!
//! - **`SledError`**: Errors from the underlying sled embedded database
//! - **`DecodeError`** / **`EncodeError`**: bincode failures on stored values
//! - **`CorruptEntry`**: A key or value that does not have the expected layout
//! - **`PictureNotFound`** / **`DuplicatePicture`**: Picture lookups by name
//! - **`Registry`**: Tag or alias validation failures
//!
//! All errors implement `std::error::Error` via the `thiserror` crate.

use sled::transaction::TransactionError;
use thiserror::Error;

use crate::tags::RegistryError;

/// Database-specific errors
#[derive(Debug, Error)]
pub enum DbError {
    /// Represents a sled database error
    #[error("Database error: {0}")]
    SledError(#[from] sled::Error),

    /// Represents a bincode decoding error
    #[error("Error while decoding data: {0}")]
    DecodeError(#[from] bincode::error::DecodeError),

    /// Represents a bincode encoding error
    #[error("Error while encoding data: {0}")]
    EncodeError(#[from] bincode::error::EncodeError),

    /// Stored key or value has an unexpected layout
    #[error("Corrupt database entry: {0}")]
    CorruptEntry(String),

    /// No picture with this name or id
    #[error("Picture not found: {0}")]
    PictureNotFound(String),

    /// A picture with this name already exists
    #[error("Picture already exists: {0}")]
    DuplicatePicture(String),

    /// Tag or alias rejected by the registry
    #[error("Tag error: {0}")]
    Registry(#[from] RegistryError),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<TransactionError<DbError>> for DbError {
    fn from(error: TransactionError<DbError>) -> Self {
        match error {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => Self::SledError(e),
        }
    }
}

impl From<DbError> for RegistryError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::Registry(e) => e,
            other => Self::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;

//! Query error types
//!
//! - **`ParseError`**: malformed query text; always shown to the user
//! - **`FlatError`**: a query cannot be turned into a flat storage filter

use thiserror::Error;

/// Malformed query text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at position {position})")]
pub struct ParseError {
    /// Byte offset of the offending token, or the text length if input ended early
    pub position: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// Reasons a query has no flat filter translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlatError {
    /// The query needs per-picture evaluation
    #[error("Query is not trivial and needs full evaluation")]
    NotTrivial,

    /// A disjunction over two or more distinct negated tags
    #[error("Query has two or more negated alternatives and cannot be flattened")]
    Degenerate,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;

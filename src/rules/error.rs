//! Implication rule error types
//!
//! - **`RuleError`**: a stored rule that cannot be loaded; the rule is dropped
//!   and loading continues
//! - **`RuleFileError`**: a rule file that cannot be read, with file and line

use thiserror::Error;

use crate::query::ParseError;
use crate::tags::RegistryError;

/// A stored rule that failed to load
#[derive(Debug, Error)]
pub enum RuleError {
    /// The trigger query does not parse
    #[error("Rule {order}: invalid trigger '{trigger}': {source}")]
    Trigger {
        order: u32,
        trigger: String,
        source: ParseError,
    },

    /// The trigger or consequence references a tag that cannot be created
    #[error("Rule {order}: {source}")]
    Binding {
        order: u32,
        source: RegistryError,
    },

    /// The consequence adds no tags
    #[error("Rule {order}: consequence '{consequence}' contains no tags")]
    EmptyConsequence { order: u32, consequence: String },
}

impl RuleError {
    /// Position of the offending rule in the rule list
    #[must_use]
    pub const fn order(&self) -> u32 {
        match self {
            Self::Trigger { order, .. }
            | Self::Binding { order, .. }
            | Self::EmptyConsequence { order, .. } => *order,
        }
    }
}

/// A rule file that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{file}:{line}: {message}")]
pub struct RuleFileError {
    pub file: String,
    pub line: usize,
    pub message: String,
}

impl RuleFileError {
    pub(crate) fn new(file: &str, line: usize, message: impl Into<String>) -> Self {
        Self {
            file: file.to_string(),
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;

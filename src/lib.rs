//! Pictag - picture tagging with a tag query language and implication rules
//!
//! Pictures carry a tag set: a base slot plus bracketed groups describing
//! things in the picture (`cat, [kitten, fluffy]`). Queries combine tags with
//! `,` (and), `|` (or), `!` (not) and `[...]` (within one group). Implication
//! rules derive further tags until nothing changes, and trivial queries are
//! answered from a reverse index in the embedded database.

use thiserror::Error;

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod output;
pub mod query;
pub mod rules;
pub mod tags;
pub mod tagset;

#[cfg(test)]
pub mod testing;

pub use db::Database;
pub use query::Query;
pub use rules::{Implications, TagImplication};
pub use tags::{TagId, TagRegistry};
pub use tagset::{TagIdSet, TagSet};

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum PictagError {
    /// Database error
    #[error("Database error: {0}")]
    DbError(#[from] db::DbError),
    /// Tag registry error
    #[error("Tag error: {0}")]
    RegistryError(#[from] tags::RegistryError),
    /// Query parse error
    #[error("Query error: {0}")]
    ParseError(#[from] query::ParseError),
    /// Rule file error
    #[error("Rule file error: {0}")]
    RuleFileError(#[from] rules::RuleFileError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ::config::ConfigError),
    /// JSON output error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

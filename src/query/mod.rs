//! Tag query language
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! query   := and ( "|" and )*
//! and     := unary ( "," unary )*
//! unary   := "!" unary | primary
//! primary := tag | "(" query ")" | "[" query "]"
//! ```
//!
//! `[...]` matches its contents within a single bracketed group of the
//! picture's tags that no other `[...]` of the same query has claimed yet.
//! Tags starting with `:` are pseudo-tags (`:any`, `:new`).
//!
//! A parsed [`Query`] has to be bound to tag ids before it can match; see
//! [`Query::bind_readonly`] and [`Query::bind_or_create`].
//!
//! # Examples
//!
//! ```
//! use pictag::query::Query;
//! use pictag::tags::MemoryRegistry;
//! use pictag::tagset::{TagIdSet, TagSet};
//!
//! let mut registry = MemoryRegistry::new();
//! let tags = TagIdSet::resolve(&TagSet::parse("cat, [kitten, fluffy]"), &mut registry)?;
//!
//! let mut query = Query::parse("cat, [kitten]")?;
//! query.bind_readonly(&registry)?;
//! assert!(query.matches(&tags));
//! assert_eq!(query.query(&tags).slots, [1]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod ast;
pub mod error;
pub mod flat;
pub(crate) mod lexer;
pub mod matcher;
pub mod parser;

pub use ast::{Binding, Leaf, Node, PseudoTag, TagRefs};
pub use error::{FlatError, ParseError};
pub use flat::FilterExpr;
pub use matcher::{MatchResult, SlotMask};

use std::fmt;
use std::str::FromStr;

use crate::tags::{Lookup, LookupOrCreate, RegistryError, TagRegistry, TagResolver};
use crate::tagset::TagIdSet;

/// A parsed query; blank text gives an empty query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    root: Option<Node>,
}

impl Query {
    /// Parse query text
    ///
    /// # Errors
    /// Returns `ParseError` for malformed text
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Ok(Self {
            root: parser::parse(text)?,
        })
    }

    #[must_use]
    pub const fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Bind every leaf through the given resolver capability
    ///
    /// # Errors
    /// Propagates registry failures
    pub fn bind<T: TagResolver + ?Sized>(&mut self, resolver: &mut T) -> Result<(), RegistryError> {
        match &mut self.root {
            Some(root) => root.bind(resolver),
            None => Ok(()),
        }
    }

    /// Bind without touching the registry; unknown tags never match
    ///
    /// # Errors
    /// Propagates registry failures
    pub fn bind_readonly<R: TagRegistry + ?Sized>(&mut self, registry: &R) -> Result<(), RegistryError> {
        self.bind(&mut Lookup(registry))
    }

    /// Bind, registering tags that do not exist yet
    ///
    /// # Errors
    /// Propagates registry failures
    pub fn bind_or_create<R: TagRegistry + ?Sized>(
        &mut self,
        registry: &mut R,
    ) -> Result<(), RegistryError> {
        self.bind(&mut LookupOrCreate(registry))
    }

    /// Does the picture match? An empty query matches everything.
    #[must_use]
    pub fn matches(&self, tags: &TagIdSet) -> bool {
        self.root
            .as_ref()
            .is_none_or(|root| matcher::matches(root, tags, None))
    }

    /// Does the query match within a single slot?
    #[must_use]
    pub fn matches_in(&self, tags: &TagIdSet, slot: usize) -> bool {
        self.root
            .as_ref()
            .is_none_or(|root| matcher::matches(root, tags, Some(slot)))
    }

    /// Detailed match with slot provenance. An empty query matches nothing.
    #[must_use]
    pub fn query(&self, tags: &TagIdSet) -> MatchResult {
        self.root
            .as_ref()
            .map_or_else(MatchResult::default, |root| matcher::query(root, tags))
    }

    #[must_use]
    pub fn uses_groups(&self) -> bool {
        self.root.as_ref().is_some_and(Node::uses_groups)
    }

    /// Can the query be answered by a flat storage filter?
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.root.as_ref().is_none_or(Node::is_trivial)
    }

    /// Flat filter equivalent of a trivial query
    ///
    /// # Errors
    /// Returns `FlatError` when the query needs per-picture evaluation
    pub fn to_flat_filter(&self) -> Result<FilterExpr, FlatError> {
        self.root
            .as_ref()
            .map_or(Ok(FilterExpr::Everything), flat::to_flat_filter)
    }

    /// Tag ids the query refers to, split by polarity
    #[must_use]
    pub fn tag_refs(&self) -> TagRefs {
        self.root.as_ref().map(flat::tag_refs).unwrap_or_default()
    }
}

impl FromStr for Query {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Some(root) => write!(f, "{root}"),
            None => Ok(()),
        }
    }
}

/// Parse query text
///
/// # Errors
/// Returns `ParseError` for malformed text
pub fn parse_query(text: &str) -> Result<Query, ParseError> {
    Query::parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::MemoryRegistry;
    use crate::tagset::TagSet;

    #[test]
    fn test_empty_query() {
        let query = Query::parse("  ").unwrap();
        let tags = TagIdSet::new();
        assert!(query.is_empty());
        assert!(query.matches(&tags));
        assert!(!query.query(&tags).matched);
        assert!(query.is_trivial());
        assert_eq!(query.to_flat_filter(), Ok(FilterExpr::Everything));
        assert_eq!(query.to_string(), "");
    }

    #[test]
    fn test_from_str_and_display() {
        let query: Query = "cat|dog , fox".parse().unwrap();
        assert_eq!(query.to_string(), "cat | dog, fox");
        assert!("cat,".parse::<Query>().is_err());
    }

    #[test]
    fn test_bind_modes() {
        let mut registry = MemoryRegistry::new();
        let mut query = parse_query("cat|dog").unwrap();

        query.bind_readonly(&registry).unwrap();
        assert!(registry.is_empty());
        assert_eq!(query.tag_refs().unresolved_positive, 2);

        query.bind_or_create(&mut registry).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(query.tag_refs().positive.len(), 2);
    }

    #[test]
    fn test_matches_in_slot() {
        let mut registry = MemoryRegistry::new();
        let tags = TagIdSet::resolve(&TagSet::parse("cat, [kitten, fluffy]"), &mut registry).unwrap();

        let mut query = parse_query("kitten, fluffy").unwrap();
        query.bind_readonly(&registry).unwrap();
        assert!(query.matches_in(&tags, 1));
        assert!(!query.matches_in(&tags, 0));
        assert!(!query.uses_groups());
    }
}

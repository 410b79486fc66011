//! Translating trivial queries into flat storage filters

use serde::Serialize;
use std::fmt;

use super::ast::{Node, TagRefs};
use super::error::FlatError;
use crate::tags::TagId;
use crate::tagset::TagIdSet;

/// Filter over picture ↔ tag associations, decidable without the matcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpr {
    /// Every picture matches
    Everything,
    /// No picture matches
    Nothing,
    /// Pictures associated with the tag
    Has(TagId),
    /// Pictures not associated with the tag
    Lacks(TagId),
    /// Pictures associated with any of `tags`, or lacking `lacking`
    AnyOf {
        tags: Vec<TagId>,
        lacking: Option<TagId>,
    },
}

impl FilterExpr {
    /// Evaluate the filter against one picture's tags
    #[must_use]
    pub fn matches(&self, tags: &TagIdSet) -> bool {
        match self {
            Self::Everything => true,
            Self::Nothing => false,
            Self::Has(id) => tags.contains_anywhere(*id),
            Self::Lacks(id) => !tags.contains_anywhere(*id),
            Self::AnyOf {
                tags: any,
                lacking,
            } => {
                any.iter().any(|id| tags.contains_anywhere(*id))
                    || lacking.is_some_and(|id| !tags.contains_anywhere(id))
            }
        }
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Everything => f.write_str("TRUE"),
            Self::Nothing => f.write_str("FALSE"),
            Self::Has(id) => write!(f, "tag = {id}"),
            Self::Lacks(id) => write!(f, "tag != {id}"),
            Self::AnyOf { tags, lacking } => {
                let ids: Vec<String> = tags.iter().map(ToString::to_string).collect();
                write!(f, "tag IN ({})", ids.join(", "))?;
                if let Some(id) = lacking {
                    write!(f, " OR tag != {id}")?;
                }
                Ok(())
            }
        }
    }
}

/// Gather the tag references of a bound tree
#[must_use]
pub fn tag_refs(root: &Node) -> TagRefs {
    let mut refs = TagRefs::default();
    root.gather_tag_ids(false, &mut refs);
    refs
}

/// Translate a bound tree into a flat filter
///
/// # Errors
/// - `FlatError::Degenerate` for a disjunction over two or more distinct
///   negated tags
/// - `FlatError::NotTrivial` for anything else the matcher has to decide
pub fn to_flat_filter(root: &Node) -> Result<FilterExpr, FlatError> {
    let refs = tag_refs(root);

    if let Node::Or(..) = root {
        if !root.is_flat_disjunction() {
            return Err(FlatError::NotTrivial);
        }
        if refs.negative.len() >= 2 {
            return Err(FlatError::Degenerate);
        }
        if !root.is_trivial() {
            return Err(FlatError::NotTrivial);
        }
        // `!ghost` holds for every picture
        if refs.unresolved_negative > 0 {
            return Ok(FilterExpr::Everything);
        }
        let lacking = refs.negative.first().copied();
        if refs.positive.is_empty() {
            return Ok(lacking.map_or(FilterExpr::Nothing, FilterExpr::Lacks));
        }
        return Ok(FilterExpr::AnyOf {
            tags: refs.positive,
            lacking,
        });
    }

    match root {
        Node::Leaf(leaf) if root.is_trivial() => {
            Ok(leaf.tag_id().map_or(FilterExpr::Nothing, FilterExpr::Has))
        }
        Node::Not(inner) if root.is_trivial() => match inner.as_ref() {
            Node::Leaf(leaf) => Ok(leaf
                .tag_id()
                .map_or(FilterExpr::Everything, FilterExpr::Lacks)),
            _ => Err(FlatError::NotTrivial),
        },
        _ => Err(FlatError::NotTrivial),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parser::parse;
    use crate::tags::{Lookup, LookupOrCreate, MemoryRegistry, TagRegistry};

    fn bound(registry: &mut MemoryRegistry, text: &str) -> Node {
        let mut tree = parse(text).unwrap().unwrap();
        tree.bind(&mut LookupOrCreate(registry)).unwrap();
        tree
    }

    fn trivial(text: &str) -> bool {
        bound(&mut MemoryRegistry::new(), text).is_trivial()
    }

    #[test]
    fn test_triviality() {
        assert!(trivial("cat"));
        assert!(trivial("!cat"));
        assert!(!trivial("cat,dog"));
        assert!(trivial("cat|dog"));
        assert!(trivial("cat|!dog"));
        assert!(!trivial("cat|!dog|!fox"));
        assert!(!trivial("[cat]"));
        assert!(!trivial("!(cat|dog)"));
        assert!(!trivial("!!cat"));
        assert!(!trivial(":any"));
        assert!(!trivial("cat|:new"));
    }

    #[test]
    fn test_single_leaf_filters() {
        let mut registry = MemoryRegistry::new();
        let tree = bound(&mut registry, "cat");
        let cat = registry.get("cat").unwrap().unwrap();
        assert_eq!(to_flat_filter(&tree), Ok(FilterExpr::Has(cat)));

        let tree = bound(&mut registry, "!cat");
        assert_eq!(to_flat_filter(&tree), Ok(FilterExpr::Lacks(cat)));
    }

    #[test]
    fn test_disjunction_filter() {
        let mut registry = MemoryRegistry::new();
        let tree = bound(&mut registry, "cat|dog|!fox");
        let id = |name: &str| registry.get(name).unwrap().unwrap();

        let filter = to_flat_filter(&tree).unwrap();
        assert_eq!(
            filter,
            FilterExpr::AnyOf {
                tags: vec![id("cat"), id("dog")],
                lacking: Some(id("fox")),
            }
        );
        assert_eq!(filter.to_string(), "tag IN (1, 2) OR tag != 3");
    }

    #[test]
    fn test_degenerate_disjunction_is_flagged() {
        let mut registry = MemoryRegistry::new();
        let tree = bound(&mut registry, "cat|!dog|!fox");
        assert_eq!(to_flat_filter(&tree), Err(FlatError::Degenerate));

        let tree = bound(&mut registry, "!dog|!fox");
        assert_eq!(to_flat_filter(&tree), Err(FlatError::Degenerate));
    }

    #[test]
    fn test_negations_inside_non_trivial_branches() {
        let mut registry = MemoryRegistry::new();
        for text in ["a,!b | !c", "!b | [!c]", "!b | !(c|d)"] {
            let tree = bound(&mut registry, text);
            assert_eq!(to_flat_filter(&tree), Err(FlatError::NotTrivial), "{text}");
        }
    }

    #[test]
    fn test_non_trivial_is_rejected() {
        let mut registry = MemoryRegistry::new();
        let tree = bound(&mut registry, "cat,dog");
        assert_eq!(to_flat_filter(&tree), Err(FlatError::NotTrivial));
    }

    #[test]
    fn test_unresolved_leaves() {
        let registry = MemoryRegistry::new();
        let readonly = |text: &str| {
            let mut tree = parse(text).unwrap().unwrap();
            tree.bind(&mut Lookup(&registry)).unwrap();
            tree
        };

        assert_eq!(to_flat_filter(&readonly("ghost")), Ok(FilterExpr::Nothing));
        assert_eq!(to_flat_filter(&readonly("!ghost")), Ok(FilterExpr::Everything));
        assert_eq!(to_flat_filter(&readonly("a|b")), Ok(FilterExpr::Nothing));
        assert_eq!(to_flat_filter(&readonly("a|!b")), Ok(FilterExpr::Everything));
    }

    #[test]
    fn test_filter_agrees_with_matcher() {
        let mut registry = MemoryRegistry::new();
        let queries = ["cat", "!cat", "cat|dog", "dog|!cat", "!fox|cat"];
        let trees: Vec<Node> = queries.iter().map(|q| bound(&mut registry, q)).collect();

        let id = |name: &str| registry.get(name).unwrap().unwrap();
        let pictures = [
            TagIdSet::new(),
            TagIdSet::from_slots([vec![id("cat")]]),
            TagIdSet::from_slots([vec![], vec![id("dog"), id("fox")]]),
        ];

        for tree in &trees {
            let filter = to_flat_filter(tree).unwrap();
            for tags in &pictures {
                assert_eq!(
                    filter.matches(tags),
                    crate::query::matcher::matches(tree, tags, None),
                    "{tree} on {tags:?}"
                );
            }
        }
    }

    #[test]
    fn test_display() {
        let id = |raw| TagId::new(raw).unwrap();
        assert_eq!(FilterExpr::Everything.to_string(), "TRUE");
        assert_eq!(FilterExpr::Nothing.to_string(), "FALSE");
        assert_eq!(FilterExpr::Has(id(3)).to_string(), "tag = 3");
        assert_eq!(FilterExpr::Lacks(id(3)).to_string(), "tag != 3");
        let any = FilterExpr::AnyOf {
            tags: vec![id(1), id(2)],
            lacking: None,
        };
        assert_eq!(any.to_string(), "tag IN (1, 2)");
    }
}

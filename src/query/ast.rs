//! Query syntax tree

use std::fmt;

use crate::tags::{self, RegistryError, TagId, TagResolver};

/// Pseudo-tags recognised by the matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoTag {
    /// `:any` always matches
    Any,
    /// `:new` matches a scope that carries no tags yet
    New,
    /// Any other `:`-prefixed name; never matches
    Unknown,
}

impl PseudoTag {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            ":any" => Self::Any,
            ":new" => Self::New,
            _ => Self::Unknown,
        }
    }
}

/// What a leaf refers to after binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Binding {
    /// Not bound yet; matches nothing
    #[default]
    Unbound,
    /// Looked up but not found; matches nothing
    Unresolved,
    Tag(TagId),
    Pseudo(PseudoTag),
}

/// A tag name or pseudo-tag in a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    value: String,
    binding: Binding,
}

impl Leaf {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            binding: Binding::Unbound,
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub const fn binding(&self) -> Binding {
        self.binding
    }

    #[must_use]
    pub fn is_pseudo(&self) -> bool {
        tags::is_pseudo(&self.value)
    }

    /// Resolved tag id, if any
    #[must_use]
    pub const fn tag_id(&self) -> Option<TagId> {
        match self.binding {
            Binding::Tag(id) => Some(id),
            _ => None,
        }
    }
}

/// Query syntax tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(Leaf),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Not(Box<Node>),
    /// Match the inner expression within one not-yet-consumed bracket group
    Group(Box<Node>),
}

/// Tag ids referenced by a query, split by polarity
///
/// An id under an odd number of enclosing `Not`s is negative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRefs {
    pub positive: Vec<TagId>,
    pub negative: Vec<TagId>,
    /// Leaves that did not resolve, outside any negation
    pub unresolved_positive: usize,
    /// Leaves that did not resolve, under a negation
    pub unresolved_negative: usize,
}

impl TagRefs {
    fn add(&mut self, id: Option<TagId>, negated: bool) {
        match (id, negated) {
            (Some(id), false) if !self.positive.contains(&id) => self.positive.push(id),
            (Some(id), true) if !self.negative.contains(&id) => self.negative.push(id),
            (Some(_), _) => {}
            (None, false) => self.unresolved_positive += 1,
            (None, true) => self.unresolved_negative += 1,
        }
    }
}

impl Node {
    #[must_use]
    pub fn leaf(value: impl Into<String>) -> Self {
        Self::Leaf(Leaf::new(value))
    }

    #[must_use]
    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    #[must_use]
    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    #[must_use]
    pub fn group(inner: Self) -> Self {
        Self::Group(Box::new(inner))
    }

    /// Binding strength: higher binds tighter
    ///
    /// `!` binds tighter than `,` which binds tighter than `|`. Leaves and
    /// bracket groups are atoms.
    #[must_use]
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Or(..) => 0,
            Self::And(..) => 1,
            Self::Not(_) => 2,
            Self::Leaf(_) | Self::Group(_) => 3,
        }
    }

    /// Resolve every leaf through `resolver`
    ///
    /// Pseudo-tags are never looked up.
    ///
    /// # Errors
    /// Propagates registry failures
    pub fn bind<T: TagResolver + ?Sized>(&mut self, resolver: &mut T) -> Result<(), RegistryError> {
        match self {
            Self::Leaf(leaf) => {
                leaf.binding = if leaf.is_pseudo() {
                    Binding::Pseudo(PseudoTag::from_name(&leaf.value))
                } else {
                    resolver
                        .resolve(&leaf.value)?
                        .map_or(Binding::Unresolved, Binding::Tag)
                };
                Ok(())
            }
            Self::And(left, right) | Self::Or(left, right) => {
                left.bind(resolver)?;
                right.bind(resolver)
            }
            Self::Not(inner) | Self::Group(inner) => inner.bind(resolver),
        }
    }

    /// Does the tree contain a `Group` anywhere?
    #[must_use]
    pub fn uses_groups(&self) -> bool {
        match self {
            Self::Leaf(_) => false,
            Self::Group(_) => true,
            Self::And(left, right) | Self::Or(left, right) => {
                left.uses_groups() || right.uses_groups()
            }
            Self::Not(inner) => inner.uses_groups(),
        }
    }

    /// Collect referenced tag ids, tracking negation depth
    pub fn gather_tag_ids(&self, negated: bool, refs: &mut TagRefs) {
        match self {
            Self::Leaf(leaf) => {
                if !leaf.is_pseudo() {
                    refs.add(leaf.tag_id(), negated);
                }
            }
            Self::And(left, right) | Self::Or(left, right) => {
                left.gather_tag_ids(negated, refs);
                right.gather_tag_ids(negated, refs);
            }
            Self::Not(inner) => inner.gather_tag_ids(!negated, refs),
            Self::Group(inner) => inner.gather_tag_ids(negated, refs),
        }
    }

    /// Can this subtree be decided by a single storage filter?
    ///
    /// True for a plain tag, a negated plain tag, or a disjunction of those
    /// with at most one negated tag. Pseudo-tags need the matcher and are
    /// never trivial.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        let mut negated = 0;
        self.trivial_disjuncts(&mut negated) && negated <= 1
    }

    /// Is this a plain tag, a negated plain tag, or a disjunction of those,
    /// however many of them are negated?
    #[must_use]
    pub fn is_flat_disjunction(&self) -> bool {
        let mut negated = 0;
        self.trivial_disjuncts(&mut negated)
    }

    fn trivial_disjuncts(&self, negated: &mut usize) -> bool {
        match self {
            Self::Leaf(leaf) => !leaf.is_pseudo(),
            Self::Not(inner) => match inner.as_ref() {
                Self::Leaf(leaf) if !leaf.is_pseudo() => {
                    *negated += 1;
                    true
                }
                _ => false,
            },
            Self::Or(left, right) => {
                left.trivial_disjuncts(negated) && right.trivial_disjuncts(negated)
            }
            Self::And(..) | Self::Group(_) => false,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, child: &Self, tighter: bool) -> fmt::Result {
        let needs_parens = if tighter {
            child.precedence() <= self.precedence()
        } else {
            child.precedence() < self.precedence()
        };
        if needs_parens {
            write!(f, "({child})")
        } else {
            write!(f, "{child}")
        }
    }
}

impl fmt::Display for Node {
    /// Canonical query text; reparses to a structurally identical tree
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(leaf) => f.write_str(&leaf.value),
            Self::And(left, right) => {
                self.fmt_child(f, left, true)?;
                f.write_str(", ")?;
                self.fmt_child(f, right, false)
            }
            Self::Or(left, right) => {
                self.fmt_child(f, left, true)?;
                f.write_str(" | ")?;
                self.fmt_child(f, right, false)
            }
            Self::Not(inner) => {
                f.write_str("!")?;
                self.fmt_child(f, inner, false)
            }
            Self::Group(inner) => write!(f, "[{inner}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{Lookup, LookupOrCreate, MemoryRegistry, TagRegistry};

    #[test]
    fn test_display_minimal_parentheses() {
        let tree = Node::and(Node::or(Node::leaf("a"), Node::leaf("b")), Node::leaf("c"));
        assert_eq!(tree.to_string(), "(a | b), c");

        let tree = Node::or(Node::and(Node::leaf("a"), Node::leaf("b")), Node::leaf("c"));
        assert_eq!(tree.to_string(), "a, b | c");

        let tree = Node::not(Node::group(Node::leaf("cat")));
        assert_eq!(tree.to_string(), "![cat]");

        let tree = Node::not(Node::and(Node::leaf("a"), Node::leaf("b")));
        assert_eq!(tree.to_string(), "!(a, b)");
    }

    #[test]
    fn test_display_left_nested_same_operator() {
        let tree = Node::and(Node::and(Node::leaf("a"), Node::leaf("b")), Node::leaf("c"));
        assert_eq!(tree.to_string(), "(a, b), c");
    }

    #[test]
    fn test_bind_readonly_leaves_unknown_unresolved() {
        let mut registry = MemoryRegistry::new();
        let cat = registry.get_or_create("cat").unwrap();

        let mut tree = Node::or(Node::leaf("cat"), Node::leaf("ghost"));
        tree.bind(&mut Lookup(&registry)).unwrap();

        let Node::Or(left, right) = &tree else { panic!("expected Or") };
        assert!(matches!(**left, Node::Leaf(ref l) if l.binding() == Binding::Tag(cat)));
        assert!(matches!(**right, Node::Leaf(ref l) if l.binding() == Binding::Unresolved));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_bind_never_looks_up_pseudo_tags() {
        let mut registry = MemoryRegistry::new();
        let mut tree = Node::and(Node::leaf(":any"), Node::leaf(":NEW"));
        tree.bind(&mut LookupOrCreate(&mut registry)).unwrap();

        let Node::And(left, right) = &tree else { panic!("expected And") };
        assert!(matches!(**left, Node::Leaf(ref l) if l.binding() == Binding::Pseudo(PseudoTag::Any)));
        assert!(matches!(**right, Node::Leaf(ref l) if l.binding() == Binding::Pseudo(PseudoTag::New)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_gather_tracks_negation_depth() {
        let mut registry = MemoryRegistry::new();
        let mut tree = Node::and(
            Node::not(Node::or(Node::leaf("a"), Node::not(Node::leaf("b")))),
            Node::leaf("c"),
        );
        tree.bind(&mut LookupOrCreate(&mut registry)).unwrap();

        let mut refs = TagRefs::default();
        tree.gather_tag_ids(false, &mut refs);

        let id = |name: &str| registry.get(name).unwrap().unwrap();
        assert_eq!(refs.positive, vec![id("b"), id("c")]);
        assert_eq!(refs.negative, vec![id("a")]);
    }

    #[test]
    fn test_uses_groups() {
        assert!(!Node::leaf("a").uses_groups());
        assert!(Node::not(Node::group(Node::leaf("a"))).uses_groups());
    }
}

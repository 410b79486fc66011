//! Tag registry: tag text ↔ stable integer id
//!
//! Tag names are normalized before every lookup (trimmed, lowercased,
//! separator characters stripped, inner whitespace collapsed) and then run
//! through the alias table, so `"  Kitty "` and `"kitty"` resolve to the same
//! canonical tag.
//!
//! Two capabilities are exposed through [`TagResolver`]:
//! - [`Lookup`]: read-only, unknown tags stay unresolved
//! - [`LookupOrCreate`]: missing tags are registered on the fly
//!
//! Query binding is written once against `TagResolver` and parameterized by
//! whichever capability the caller holds.
//!
//! # Examples
//!
//! ```
//! use pictag::tags::{MemoryRegistry, TagRegistry};
//!
//! let mut registry = MemoryRegistry::new();
//! registry.add_alias("kitty", "cat")?;
//!
//! let cat = registry.get_or_create("Cat")?;
//! assert_eq!(registry.get("kitty")?, Some(cat));
//! assert_eq!(registry.get("dog")?, None);
//! # Ok::<(), pictag::tags::RegistryError>(())
//! ```

pub mod aliases;
pub mod error;
mod registry;

pub use aliases::AliasTable;
pub use error::{RegistryError, Result};
pub use registry::MemoryRegistry;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters that separate tokens in tag strings and queries
pub const SEPARATORS: [char; 7] = ['(', ')', '[', ']', '!', ',', '|'];

/// Prefix reserved for pseudo-tags such as `:any`
pub const PSEUDO_PREFIX: char = ':';

/// Characters a user-entered tag name may not contain
const FORBIDDEN_CHARS: [char; 4] = ['!', '(', ')', '|'];

/// Stable id of a registered tag
///
/// Ids are always positive; an unresolved tag is represented by the absence
/// of an id (`Option<TagId>`), never by a sentinel value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Encode, Decode,
)]
pub struct TagId(u64);

impl TagId {
    /// Wrap a raw id, rejecting the non-positive "not found" values
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage-side view of the tag registry
///
/// Implementations normalize and alias-resolve `name` before looking it up.
pub trait TagRegistry {
    /// Look up a tag id without creating anything
    ///
    /// # Errors
    /// Returns `RegistryError::Backend` if the backing store fails
    fn get(&self, name: &str) -> Result<Option<TagId>>;

    /// Look up a tag id, registering the tag if it does not exist yet
    ///
    /// # Errors
    /// Returns `RegistryError::InvalidName` for names that normalize to
    /// nothing or name a pseudo-tag, `RegistryError::Backend` on store failure
    fn get_or_create(&mut self, name: &str) -> Result<TagId>;

    /// Canonical text of a registered tag
    ///
    /// # Errors
    /// Returns `RegistryError::Backend` if the backing store fails
    fn name(&self, id: TagId) -> Result<Option<String>>;
}

/// Capability used when binding query leaves to tag ids
pub trait TagResolver {
    /// Resolve a tag name, `None` meaning "unresolved"
    ///
    /// # Errors
    /// Propagates registry failures
    fn resolve(&mut self, name: &str) -> Result<Option<TagId>>;
}

/// Read-only resolution: unknown tags are left unresolved
pub struct Lookup<'a, R: ?Sized>(pub &'a R);

/// Creating resolution: unknown tags are registered
pub struct LookupOrCreate<'a, R: ?Sized>(pub &'a mut R);

impl<R: TagRegistry + ?Sized> TagResolver for Lookup<'_, R> {
    fn resolve(&mut self, name: &str) -> Result<Option<TagId>> {
        self.0.get(name)
    }
}

impl<R: TagRegistry + ?Sized> TagResolver for LookupOrCreate<'_, R> {
    fn resolve(&mut self, name: &str) -> Result<Option<TagId>> {
        self.0.get_or_create(name).map(Some)
    }
}

/// Normalize a tag name for storage and lookup
///
/// Strips separator characters, trims, lowercases and collapses inner
/// whitespace runs into single spaces.
#[must_use]
pub fn normalize(name: &str) -> String {
    let stripped: String = name.chars().filter(|c| !SEPARATORS.contains(c)).collect();
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Check whether a name refers to a pseudo-tag
#[must_use]
pub fn is_pseudo(name: &str) -> bool {
    name.trim_start().starts_with(PSEUDO_PREFIX)
}

/// Validate a user-entered tag name
///
/// # Errors
/// Returns `RegistryError::InvalidTag` if the name starts with the pseudo-tag
/// prefix or contains one of `! ( ) |`
pub fn validate_tag_name(name: &str) -> Result<()> {
    if is_pseudo(name) {
        return Err(RegistryError::InvalidTag(format!(
            "'{name}' starts with '{PSEUDO_PREFIX}', which is reserved for pseudo-tags"
        )));
    }
    if let Some(bad) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(RegistryError::InvalidTag(format!(
            "'{name}' contains reserved character '{bad}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Fluffy   Cat "), "fluffy cat");
        assert_eq!(normalize("cat!"), "cat");
        assert_eq!(normalize("(a|b)"), "ab");
        assert_eq!(normalize("[ ]"), "");
    }

    #[test]
    fn test_tag_id_rejects_zero() {
        assert!(TagId::new(0).is_none());
        assert_eq!(TagId::new(7).map(TagId::get), Some(7));
    }

    #[test]
    fn test_validate_tag_name() {
        assert!(validate_tag_name("cat").is_ok());
        assert!(validate_tag_name("black cat").is_ok());
        assert!(validate_tag_name("a:b").is_ok());
        assert!(matches!(
            validate_tag_name(":any"),
            Err(RegistryError::InvalidTag(_))
        ));
        assert!(matches!(
            validate_tag_name("cat(s)"),
            Err(RegistryError::InvalidTag(_))
        ));
        assert!(validate_tag_name("cat|dog").is_err());
        assert!(validate_tag_name("no!").is_err());
    }

    #[test]
    fn test_lookup_does_not_create() {
        let mut registry = MemoryRegistry::new();
        let mut lookup = Lookup(&registry);
        assert_eq!(lookup.resolve("cat").unwrap(), None);
        assert!(registry.is_empty());

        let id = LookupOrCreate(&mut registry).resolve("cat").unwrap();
        assert!(id.is_some());
        assert_eq!(Lookup(&registry).resolve("CAT").unwrap(), id);
    }
}

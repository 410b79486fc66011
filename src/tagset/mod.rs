//! Tag set model
//!
//! A picture's tags are grouped into ordered *slots*. Slot 0 (the "zero set")
//! holds ungrouped tags; every bracketed group `[ ... ]` in a tag string opens
//! a new slot. `"cat, [kitten, fluffy], [dog]"` has three slots:
//!
//! | slot | tags              |
//! |------|-------------------|
//! | 0    | `cat`             |
//! | 1    | `kitten`, `fluffy`|
//! | 2    | `dog`             |
//!
//! [`TagSet`] is the string form produced from user input; [`TagIdSet`] is
//! the resolved form used for matching and persistence.

mod id_set;

pub use id_set::{AssociationRow, PictureId, TagIdSet};

use serde::Serialize;
use std::fmt;

use crate::query::lexer::split_tokens;
use crate::tags::{self, RegistryError};

const TAGSET_SEPARATORS: [char; 3] = [',', '[', ']'];

/// The tags of a picture in string form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSet {
    slots: Vec<Vec<String>>,
}

impl Default for TagSet {
    fn default() -> Self {
        Self {
            slots: vec![Vec::new()],
        }
    }
}

impl TagSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a tag string
    ///
    /// Tags are separated with commas and may be grouped with `[]`. The parser
    /// is lenient: a `[` inside an open group is ignored, a stray `]` just
    /// closes nothing.
    ///
    /// # Examples
    /// ```
    /// use pictag::tagset::TagSet;
    ///
    /// let tags = TagSet::parse("cat, [kitten, fluffy]");
    /// assert_eq!(tags.tags(0), ["cat"]);
    /// assert_eq!(tags.tags(1), ["kitten", "fluffy"]);
    /// assert_eq!(tags.to_string(), "cat, [kitten, fluffy]");
    /// ```
    #[must_use]
    pub fn parse(tagstring: &str) -> Self {
        let mut tags = Self::new();
        let mut group_open = false;

        for token in split_tokens(tagstring, &TAGSET_SEPARATORS) {
            match token.text {
                "," => {}
                "[" => {
                    if !group_open {
                        tags.slots.push(Vec::new());
                        group_open = true;
                    }
                }
                "]" => group_open = false,
                tag => {
                    let slot = if group_open { tags.slots.len() - 1 } else { 0 };
                    tags.slots[slot].push(tag.to_string());
                }
            }
        }

        tags
    }

    /// Number of slots, the zero set included
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of bracketed groups
    #[must_use]
    pub fn groups(&self) -> usize {
        self.slots.len() - 1
    }

    /// Tags in the given slot; empty for slots that do not exist
    #[must_use]
    pub fn tags(&self, slot: usize) -> &[String] {
        self.slots.get(slot).map_or(&[], Vec::as_slice)
    }

    /// Iterate over `(slot, tag)` pairs in slot order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.slots
            .iter()
            .enumerate()
            .flat_map(|(slot, tags)| tags.iter().map(move |tag| (slot, tag.as_str())))
    }

    /// True when no slot holds a tag
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Vec::is_empty)
    }

    /// Check every tag against the user-facing naming rules
    ///
    /// # Errors
    /// Returns the first `RegistryError::InvalidTag` found
    pub fn validate(&self) -> Result<(), RegistryError> {
        self.iter()
            .try_for_each(|(_, tag)| tags::validate_tag_name(tag))
    }
}

impl fmt::Display for TagSet {
    /// Writes the tag set in the format accepted by [`TagSet::parse`]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slots[0].join(", "))?;

        for (index, group) in self.slots.iter().enumerate().skip(1) {
            if index > 1 || !self.slots[0].is_empty() {
                f.write_str(", ")?;
            }
            write!(f, "[{}]", group.join(", "))?;
        }

        Ok(())
    }
}

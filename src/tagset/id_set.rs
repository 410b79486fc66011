use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::TagSet;
use crate::tags::{RegistryError, TagId, TagRegistry};

/// Id of a picture in the gallery
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Encode, Decode,
)]
pub struct PictureId(pub u64);

impl fmt::Display for PictureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One picture ↔ tag association as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct AssociationRow {
    pub picture: PictureId,
    pub tag: TagId,
    pub slot: u32,
}

/// Resolved form of a tag set
///
/// Same slot structure as [`TagSet`], but every slot holds deduplicated tag
/// ids. Slot 0 always exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagIdSet {
    slots: Vec<Vec<TagId>>,
    picture: Option<PictureId>,
}

impl Default for TagIdSet {
    fn default() -> Self {
        Self {
            slots: vec![Vec::new()],
            picture: None,
        }
    }
}

impl TagIdSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty tag set belonging to a picture
    #[must_use]
    pub fn for_picture(picture: PictureId) -> Self {
        Self {
            picture: Some(picture),
            ..Self::default()
        }
    }

    /// Build from explicit slots, dropping duplicate ids within each slot
    #[must_use]
    pub fn from_slots<I, S>(slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = TagId>,
    {
        let mut set = Self { slots: Vec::new(), picture: None };
        for (index, tags) in slots.into_iter().enumerate() {
            set.slots.push(Vec::new());
            for tag in tags {
                if !set.slots[index].contains(&tag) {
                    set.slots[index].push(tag);
                }
            }
        }
        if set.slots.is_empty() {
            set.slots.push(Vec::new());
        }
        set
    }

    /// Resolve a string tag set, creating missing tags in the registry
    ///
    /// # Errors
    /// Returns `RegistryError` if a tag name is invalid or the registry fails
    pub fn resolve<R>(tagset: &TagSet, registry: &mut R) -> Result<Self, RegistryError>
    where
        R: TagRegistry + ?Sized,
    {
        let mut set = Self::new();
        for _ in 0..tagset.groups() {
            set.slots.push(Vec::new());
        }
        for (slot, tag) in tagset.iter() {
            let id = registry.get_or_create(tag)?;
            set.insert_tags(&[id], slot);
        }
        Ok(set)
    }

    /// Rebuild tag sets from association rows ordered by `(picture, slot)`
    ///
    /// Slot numbers are renumbered contiguously, so gaps left by manual edits
    /// of the store collapse instead of producing empty slots.
    #[must_use]
    pub fn from_rows<I>(rows: I) -> Vec<Self>
    where
        I: IntoIterator<Item = AssociationRow>,
    {
        let mut sets: Vec<Self> = Vec::new();
        let mut last_slot = 0;

        for row in rows {
            if sets.last().is_none_or(|set| set.picture != Some(row.picture)) {
                sets.push(Self::for_picture(row.picture));
                last_slot = 0;
            }
            let Some(current) = sets.last_mut() else { continue };

            if row.slot > last_slot {
                last_slot = row.slot;
                current.slots.push(Vec::new());
            }
            let slot = current.slots.len() - 1;
            current.insert_tags(&[row.tag], slot);
        }

        sets
    }

    /// Flatten into association rows
    #[must_use]
    pub fn rows(&self) -> Vec<(TagId, u32)> {
        self.slots
            .iter()
            .enumerate()
            .flat_map(|(slot, tags)| {
                let slot = u32::try_from(slot).unwrap_or(u32::MAX);
                tags.iter().map(move |tag| (*tag, slot))
            })
            .collect()
    }

    #[must_use]
    pub const fn picture(&self) -> Option<PictureId> {
        self.picture
    }

    pub fn set_picture(&mut self, picture: PictureId) {
        self.picture = Some(picture);
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
    pub fn tags(&self, slot: usize) -> &[TagId] {
        self.slots.get(slot).map_or(&[], Vec::as_slice)
    }

    /// Does the given slot contain the tag?
    #[must_use]
    pub fn contains(&self, slot: usize, tag: TagId) -> bool {
        self.tags(slot).contains(&tag)
    }

    /// Does any slot contain the tag?
    #[must_use]
    pub fn contains_anywhere(&self, tag: TagId) -> bool {
        self.slots.iter().any(|slot| slot.contains(&tag))
    }

    /// Sum of the tag counts of all slots
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    /// Insert tags into a slot, skipping ids already present there
    ///
    /// Missing slots up to `slot` are created. Returns the number of ids added.
    pub fn insert_tags(&mut self, tags: &[TagId], slot: usize) -> usize {
        while self.slots.len() <= slot {
            self.slots.push(Vec::new());
        }
        let target = &mut self.slots[slot];
        let before = target.len();
        for tag in tags {
            if !target.contains(tag) {
                target.push(*tag);
            }
        }
        target.len() - before
    }

    /// Append `tags` as a new group slot and return its index
    pub fn insert_group(&mut self, tags: &[TagId]) -> usize {
        let mut group = Vec::with_capacity(tags.len());
        for tag in tags {
            if !group.contains(tag) {
                group.push(*tag);
            }
        }
        self.slots.push(group);
        self.slots.len() - 1
    }

    /// Convert back to string form through the registry
    ///
    /// # Errors
    /// Returns `RegistryError::Backend` if the registry fails
    pub fn to_tag_set<R>(&self, registry: &R) -> Result<TagSet, RegistryError>
    where
        R: TagRegistry + ?Sized,
    {
        let mut slots = Vec::with_capacity(self.slots.len());
        for tags in &self.slots {
            let mut names = Vec::with_capacity(tags.len());
            for tag in tags {
                names.push(registry.name(*tag)?.unwrap_or_else(|| format!("#{tag}")));
            }
            slots.push(names);
        }
        Ok(TagSet { slots })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::MemoryRegistry;

    fn id(raw: u64) -> TagId {
        TagId::new(raw).unwrap()
    }

    fn row(picture: u64, tag: u64, slot: u32) -> AssociationRow {
        AssociationRow {
            picture: PictureId(picture),
            tag: id(tag),
            slot,
        }
    }

    #[test]
    fn test_zero_slot_always_exists() {
        let set = TagIdSet::new();
        assert_eq!(set.slot_count(), 1);
        assert_eq!(set.groups(), 0);
        assert!(set.tags(0).is_empty());

        let empty = TagIdSet::from_slots(Vec::<Vec<TagId>>::new());
        assert_eq!(empty.slot_count(), 1);
    }

    #[test]
    fn test_resolve_dedups_within_slot() {
        let mut registry = MemoryRegistry::new();
        let tagset = TagSet::parse("cat, Cat, [cat, kitten]");
        let set = TagIdSet::resolve(&tagset, &mut registry).unwrap();

        let cat = registry.get("cat").unwrap().unwrap();
        let kitten = registry.get("kitten").unwrap().unwrap();
        assert_eq!(set.tags(0), [cat]);
        assert_eq!(set.tags(1), [cat, kitten]);
        assert_eq!(set.total_count(), 3);
    }

    #[test]
    fn test_resolve_keeps_empty_groups() {
        let mut registry = MemoryRegistry::new();
        let set = TagIdSet::resolve(&TagSet::parse("a, []"), &mut registry).unwrap();
        assert_eq!(set.groups(), 1);
    }

    #[test]
    fn test_insert_tags_skips_present_ids() {
        let mut set = TagIdSet::from_slots([vec![id(1)], vec![id(2)]]);
        assert_eq!(set.insert_tags(&[id(1), id(3)], 0), 1);
        assert_eq!(set.insert_tags(&[id(2)], 1), 0);
        assert_eq!(set.tags(0), [id(1), id(3)]);
        assert_eq!(set.total_count(), 3);
    }

    #[test]
    fn test_insert_group_appends_slot() {
        let mut set = TagIdSet::from_slots([vec![], vec![id(1), id(2)]]);
        assert_eq!(set.insert_group(&[id(2)]), 2);
        assert_eq!(set.insert_group(&[id(3), id(3)]), 3);
        assert_eq!(set.groups(), 3);
        assert_eq!(set.tags(2), [id(2)]);
        assert_eq!(set.tags(3), [id(3)]);
    }

    #[test]
    fn test_from_rows_groups_by_picture() {
        let rows = vec![
            row(1, 10, 0),
            row(1, 11, 1),
            row(1, 12, 1),
            row(2, 10, 0),
            row(3, 13, 2),
        ];
        let sets = TagIdSet::from_rows(rows);
        assert_eq!(sets.len(), 3);

        assert_eq!(sets[0].picture(), Some(PictureId(1)));
        assert_eq!(sets[0].tags(0), [id(10)]);
        assert_eq!(sets[0].tags(1), [id(11), id(12)]);

        assert_eq!(sets[1].groups(), 0);

        // Gaps in slot numbering collapse
        assert_eq!(sets[2].groups(), 1);
        assert!(sets[2].tags(0).is_empty());
        assert_eq!(sets[2].tags(1), [id(13)]);
    }

    #[test]
    fn test_rows_round_trip() {
        let set = TagIdSet::from_slots([vec![id(1)], vec![id(2), id(3)]]);
        let rows: Vec<AssociationRow> = set
            .rows()
            .into_iter()
            .map(|(tag, slot)| AssociationRow { picture: PictureId(9), tag, slot })
            .collect();
        let rebuilt = TagIdSet::from_rows(rows).remove(0);
        assert_eq!(rebuilt.tags(0), set.tags(0));
        assert_eq!(rebuilt.tags(1), set.tags(1));
    }

    #[test]
    fn test_to_tag_set() {
        let mut registry = MemoryRegistry::new();
        let tagset = TagSet::parse("cat, [kitten, fluffy]");
        let set = TagIdSet::resolve(&tagset, &mut registry).unwrap();
        assert_eq!(set.to_tag_set(&registry).unwrap(), tagset);
    }
}

//! Database wrapper module for pictag
//!
//! Persists the tag registry, aliases, implication rules, pictures and
//! picture ↔ tag associations in an embedded sled database.
//!
//! Uses multiple sled trees:
//! - `tags`: normalized tag name → tag id
//! - `tag_names`: tag id → canonical tag name
//! - `aliases`: alias → canonical tag name
//! - `rules`: rule order → [`RuleRow`]
//! - `pictures`: picture id → [`PictureRecord`]
//! - `picture_names`: picture name → picture id
//! - `tagmap`: [`AssociationKey`] → ()
//! - `tag_index`: [`IndexKey`] → (), the reverse index used by flat filters

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionalTree};
use sled::{Batch, Db, Transactional, Tree};
use std::path::Path;
use tracing::debug;

pub mod error;
pub mod rebuild;
pub mod search;
pub mod types;

pub use error::DbError;
pub use rebuild::RebuildReport;
pub use types::{AssociationKey, IndexKey};

use crate::rules::{Implications, RuleRow};
use crate::tags::{self, AliasTable, RegistryError, TagId, TagRegistry};
use crate::tagset::{AssociationRow, PictureId, TagIdSet, TagSet};

const EMPTY: &[u8] = &[];

/// A stored picture and the tag string it was last tagged with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct PictureRecord {
    pub id: PictureId,
    pub name: String,
    pub tags: String,
}

/// Database wrapper that encapsulates all storage operations
pub struct Database {
    db: Db,
    tags: Tree,
    tag_names: Tree,
    aliases: Tree,
    rules: Tree,
    pictures: Tree,
    picture_names: Tree,
    tagmap: Tree,
    tag_index: Tree,
}

impl Database {
    /// Opens or creates a database at the specified path
    ///
    /// # Examples
    /// ```no_run
    /// use pictag::db::Database;
    /// let db = Database::open("my_db").unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the database cannot be opened or if the internal trees cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let db = sled::open(path)?;
        Ok(Self {
            tags: db.open_tree("tags")?,
            tag_names: db.open_tree("tag_names")?,
            aliases: db.open_tree("aliases")?,
            rules: db.open_tree("rules")?,
            pictures: db.open_tree("pictures")?,
            picture_names: db.open_tree("picture_names")?,
            tagmap: db.open_tree("tagmap")?,
            tag_index: db.open_tree("tag_index")?,
            db,
        })
    }

    // Pictures

    /// Register a picture and tag it
    ///
    /// The tag string is validated, resolved and expanded with the active
    /// implication rules before the associations are stored.
    ///
    /// # Errors
    ///
    /// Returns `DbError::DuplicatePicture` if the name is taken, `DbError::Registry`
    /// for invalid tags, or any storage error.
    pub fn add_picture(&mut self, name: &str, tag_string: &str) -> Result<PictureRecord, DbError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DbError::InvalidInput("picture name is empty".to_string()));
        }
        if self.picture_names.contains_key(name.as_bytes())? {
            return Err(DbError::DuplicatePicture(name.to_string()));
        }
        let tagset = TagSet::parse(tag_string);
        tagset.validate()?;

        let id = PictureId(self.db.generate_id()? + 1);
        let rules = self.load_implications()?;
        let tags = self.derive_tags(id, &tagset, &rules)?;

        let record = PictureRecord {
            id,
            name: name.to_string(),
            tags: tagset.to_string(),
        };
        self.put_picture(&record)?;
        self.picture_names
            .insert(name.as_bytes(), &types::id_key(id.0)[..])?;
        if let Err(e) = self.save_tag_id_set(&tags) {
            self.remove_picture(id)?;
            return Err(e);
        }
        debug!(picture = %id, name, "Added picture");
        Ok(record)
    }

    /// Replace a picture's tag string and recompute its associations
    ///
    /// Loads the active rules; use [`Database::set_tags_with`] to reuse an
    /// already loaded rule set.
    ///
    /// # Errors
    ///
    /// Returns `DbError::PictureNotFound` for unknown pictures, `DbError::Registry`
    /// for invalid tags, or any storage error.
    pub fn set_tags(&mut self, picture: PictureId, tag_string: &str) -> Result<TagIdSet, DbError> {
        let rules = self.load_implications()?;
        self.set_tags_with(picture, tag_string, &rules)
    }

    /// [`Database::set_tags`] with an explicit rule set
    ///
    /// # Errors
    ///
    /// See [`Database::set_tags`].
    pub fn set_tags_with(
        &mut self,
        picture: PictureId,
        tag_string: &str,
        rules: &Implications,
    ) -> Result<TagIdSet, DbError> {
        let mut record = self
            .get_picture(picture)?
            .ok_or_else(|| DbError::PictureNotFound(picture.to_string()))?;

        let tagset = TagSet::parse(tag_string);
        tagset.validate()?;
        record.tags = tagset.to_string();

        let tags = self.derive_tags(picture, &tagset, rules)?;
        self.put_picture(&record)?;
        self.save_tag_id_set(&tags)?;
        Ok(tags)
    }

    /// Resolve a tag set for a picture and run the rules over it
    pub(crate) fn derive_tags(
        &mut self,
        picture: PictureId,
        tagset: &TagSet,
        rules: &Implications,
    ) -> Result<TagIdSet, DbError> {
        let mut tags = TagIdSet::resolve(tagset, self)?;
        tags.set_picture(picture);
        rules.apply(&mut tags);
        Ok(tags)
    }

    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or deserialization errors occur.
    pub fn get_picture(&self, picture: PictureId) -> Result<Option<PictureRecord>, DbError> {
        self.pictures
            .get(types::id_key(picture.0))?
            .map(|value| types::decode(&value))
            .transpose()
    }

    /// Look a picture up by name
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or deserialization errors occur.
    pub fn find_picture(&self, name: &str) -> Result<Option<PictureRecord>, DbError> {
        match self.picture_names.get(name.trim().as_bytes())? {
            Some(id) => self.get_picture(PictureId(types::read_id(&id)?)),
            None => Ok(None),
        }
    }

    /// All pictures ordered by id
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database iteration fails or deserialization errors occur.
    pub fn list_pictures(&self) -> Result<Vec<PictureRecord>, DbError> {
        let mut pictures = Vec::new();
        for result in self.pictures.iter() {
            let (_, value) = result?;
            pictures.push(types::decode(&value)?);
        }
        Ok(pictures)
    }

    /// Remove a picture together with its associations
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail.
    pub fn remove_picture(&self, picture: PictureId) -> Result<bool, DbError> {
        let Some(record) = self.get_picture(picture)? else {
            return Ok(false);
        };

        let mut empty = TagIdSet::new();
        empty.set_picture(picture);
        self.save_tag_id_set(&empty)?;

        self.picture_names.remove(record.name.as_bytes())?;
        self.pictures.remove(types::id_key(picture.0))?;
        debug!(picture = %picture, name = %record.name, "Removed picture");
        Ok(true)
    }

    /// Number of stored pictures
    #[must_use]
    pub fn count(&self) -> usize {
        self.pictures.len()
    }

    fn put_picture(&self, record: &PictureRecord) -> Result<(), DbError> {
        self.pictures
            .insert(types::id_key(record.id.0), types::encode(record)?)?;
        Ok(())
    }

    // Associations

    /// Load a picture's resolved tags
    ///
    /// A picture without associations yields an empty set.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or a key is corrupt.
    pub fn load_tag_id_set(&self, picture: PictureId) -> Result<TagIdSet, DbError> {
        let rows = self.association_rows(&AssociationKey::prefix(picture))?;
        Ok(TagIdSet::from_rows(rows)
            .pop()
            .unwrap_or_else(|| TagIdSet::for_picture(picture)))
    }

    /// Replace a picture's associations in one transaction
    ///
    /// Old rows and their reverse index entries are deleted, then the new
    /// rows are inserted. Readers never see a half-written picture.
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidInput` if the set has no picture, or any storage error.
    pub fn save_tag_id_set(&self, tags: &TagIdSet) -> Result<(), DbError> {
        let picture = tags
            .picture()
            .ok_or_else(|| DbError::InvalidInput("tag set has no picture".to_string()))?;

        let old: Vec<AssociationKey> = self
            .tagmap
            .scan_prefix(AssociationKey::prefix(picture))
            .keys()
            .map(|key| -> Result<AssociationKey, DbError> { AssociationKey::from_bytes(&key?) })
            .collect::<Result<_, _>>()?;
        let new: Vec<AssociationKey> = tags
            .rows()
            .into_iter()
            .map(|(tag, slot)| AssociationKey { picture, slot, tag })
            .collect();

        (&self.tagmap, &self.tag_index).transaction(
            |(tagmap, index): &(TransactionalTree, TransactionalTree)| {
                for key in &old {
                    tagmap.remove(&key.to_bytes()[..])?;
                    index.remove(&IndexKey { tag: key.tag, picture }.to_bytes()[..])?;
                }
                for key in &new {
                    tagmap.insert(&key.to_bytes()[..], EMPTY)?;
                    index.insert(&IndexKey { tag: key.tag, picture }.to_bytes()[..], EMPTY)?;
                }
                Ok::<(), ConflictableTransactionError<DbError>>(())
            },
        )?;

        debug!(picture = %picture, removed = old.len(), inserted = new.len(), "Saved associations");
        Ok(())
    }

    /// All association rows ordered by `(picture, slot)`
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database iteration fails or a key is corrupt.
    pub fn associations(&self) -> Result<Vec<AssociationRow>, DbError> {
        self.association_rows(&[])
    }

    fn association_rows(&self, prefix: &[u8]) -> Result<Vec<AssociationRow>, DbError> {
        self.tagmap
            .scan_prefix(prefix)
            .keys()
            .map(|key| -> Result<AssociationRow, DbError> {
                Ok(AssociationKey::from_bytes(&key?)?.into())
            })
            .collect()
    }

    // Rules and aliases

    /// Stored implication rules ordered by `order`
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database iteration fails or deserialization errors occur.
    pub fn rule_rows(&self) -> Result<Vec<RuleRow>, DbError> {
        let mut rows = Vec::new();
        for result in self.rules.iter() {
            let (_, value) = result?;
            rows.push(types::decode(&value)?);
        }
        Ok(rows)
    }

    /// Replace every stored implication rule
    ///
    /// # Errors
    ///
    /// Returns `DbError` if encoding or the batch write fails.
    pub fn replace_rules(&self, rows: &[RuleRow]) -> Result<(), DbError> {
        let mut batch = Batch::default();
        for key in self.rules.iter().keys() {
            batch.remove(key?);
        }
        for row in rows {
            batch.insert(&types::id_key(u64::from(row.order))[..], types::encode(row)?);
        }
        self.rules.apply_batch(batch)?;
        debug!(count = rows.len(), "Replaced implication rules");
        Ok(())
    }

    /// Load and bind the stored rules, registering the tags they mention
    ///
    /// Rules that fail to load are dropped and logged.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the rules cannot be read.
    pub fn load_implications(&mut self) -> Result<Implications, DbError> {
        let rows = self.rule_rows()?;
        Ok(Implications::load(rows, self))
    }

    /// Stored aliases as a validated table
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the aliases cannot be read or no longer validate.
    pub fn alias_table(&self) -> Result<AliasTable, DbError> {
        Ok(AliasTable::from_pairs(self.list_aliases()?)?)
    }

    /// Add an alias after checking it against the stored ones
    ///
    /// # Errors
    ///
    /// Returns `DbError::Registry` if the alias is rejected, or any storage error.
    pub fn add_alias(&self, alias: &str, canonical: &str) -> Result<(), DbError> {
        let mut table = self.alias_table()?;
        table.add_alias(alias, canonical)?;
        self.aliases.insert(
            tags::normalize(alias).as_bytes(),
            tags::normalize(canonical).as_bytes(),
        )?;
        Ok(())
    }

    /// Remove an alias, returning its canonical tag
    ///
    /// # Errors
    ///
    /// Returns `DbError::Registry` with `AliasNotFound` if the alias does not exist.
    pub fn remove_alias(&self, alias: &str) -> Result<String, DbError> {
        let normalized = tags::normalize(alias);
        match self.aliases.remove(normalized.as_bytes())? {
            Some(canonical) => Ok(utf8(&canonical)?),
            None => Err(RegistryError::AliasNotFound(normalized).into()),
        }
    }

    /// `(alias, canonical)` pairs sorted by alias
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database iteration fails or an entry is not UTF-8.
    pub fn list_aliases(&self) -> Result<Vec<(String, String)>, DbError> {
        let mut aliases = Vec::new();
        for result in self.aliases.iter() {
            let (alias, canonical) = result?;
            aliases.push((utf8(&alias)?, utf8(&canonical)?));
        }
        Ok(aliases)
    }

    /// Replace every stored alias with a validated set
    ///
    /// # Errors
    ///
    /// Returns `DbError::Registry` if the set does not validate, or any storage error.
    pub fn replace_aliases(&self, pairs: &[(String, String)]) -> Result<(), DbError> {
        let table = AliasTable::from_pairs(pairs.iter().map(|(a, c)| (a.as_str(), c.as_str())))?;

        let mut batch = Batch::default();
        for key in self.aliases.iter().keys() {
            batch.remove(key?);
        }
        for (alias, canonical) in table.list_aliases() {
            batch.insert(alias.as_bytes(), canonical.as_bytes());
        }
        self.aliases.apply_batch(batch)?;
        Ok(())
    }

    // Tags

    /// Number of registered tags
    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    fn canonical(&self, name: &str) -> Result<String, DbError> {
        let normalized = tags::normalize(name);
        match self.aliases.get(normalized.as_bytes())? {
            Some(canonical) => utf8(&canonical),
            None => Ok(normalized),
        }
    }

    fn lookup(&self, canonical: &str) -> Result<Option<TagId>, DbError> {
        self.tags
            .get(canonical.as_bytes())?
            .map(|id| types::read_tag_id(&id))
            .transpose()
    }

    fn create_tag(&self, canonical: &str) -> Result<TagId, DbError> {
        let id = TagId::new(self.db.generate_id()? + 1)
            .ok_or_else(|| DbError::CorruptEntry("tag id overflow".to_string()))?;

        // A concurrent writer may have registered the same name first
        match self.tags.compare_and_swap(
            canonical.as_bytes(),
            None::<&[u8]>,
            Some(&types::id_key(id.get())[..]),
        )? {
            Ok(()) => {
                self.tag_names
                    .insert(types::id_key(id.get()), canonical.as_bytes())?;
                debug!(tag = canonical, id = %id, "Registered tag");
                Ok(id)
            }
            Err(conflict) => match conflict.current {
                Some(existing) => types::read_tag_id(&existing),
                None => Err(DbError::CorruptEntry(format!("tag '{canonical}' vanished"))),
            },
        }
    }

    /// Flush all pending writes to disk
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the flush operation fails.
    pub fn flush(&self) -> Result<(), DbError> {
        self.db.flush()?;
        Ok(())
    }
}

impl TagRegistry for Database {
    fn get(&self, name: &str) -> tags::Result<Option<TagId>> {
        let canonical = self.canonical(name)?;
        Ok(self.lookup(&canonical)?)
    }

    fn get_or_create(&mut self, name: &str) -> tags::Result<TagId> {
        let canonical = self.canonical(name)?;
        if canonical.is_empty() || tags::is_pseudo(&canonical) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        match self.lookup(&canonical)? {
            Some(id) => Ok(id),
            None => Ok(self.create_tag(&canonical)?),
        }
    }

    fn name(&self, id: TagId) -> tags::Result<Option<String>> {
        match self.tag_names.get(types::id_key(id.get())).map_err(DbError::from)? {
            Some(name) => Ok(Some(utf8(&name)?)),
            None => Ok(None),
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        // Flush errors cannot surface from Drop
        let _ = self.db.flush();
    }
}

fn utf8(bytes: &[u8]) -> Result<String, DbError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| DbError::CorruptEntry("invalid UTF-8 in stored text".to_string()))
}

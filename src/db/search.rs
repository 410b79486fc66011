//! Query evaluation against the stored pictures
//!
//! Trivial queries are translated to a [`FilterExpr`] and answered from the
//! reverse tag index without loading any tag set. Everything else, the
//! degenerate negated disjunctions included, is evaluated per picture in
//! parallel with the full matcher.

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::types::{self, IndexKey};
use super::{Database, DbError, PictureRecord};
use crate::query::{FilterExpr, Query};
use crate::tags::TagId;
use crate::tagset::{PictureId, TagIdSet};

impl Database {
    /// Pictures matching `query`, ordered by id
    ///
    /// The query is bound read-only, so tags it mentions that do not exist
    /// simply match nothing. An empty query matches every picture.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or stored data is corrupt.
    pub fn search(&self, query: &Query) -> Result<Vec<PictureRecord>, DbError> {
        let mut query = query.clone();
        query.bind_readonly(self)?;

        let ids = match query.to_flat_filter() {
            Ok(filter) => {
                debug!(%filter, "Searching with flat filter");
                self.filter_pictures(&filter)?
            }
            Err(reason) => {
                debug!(%reason, query = %query, "Searching with full evaluation");
                self.scan_pictures(&query)?
            }
        };

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.get_picture(id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Evaluate a flat filter using only the reverse index
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or an index key is corrupt.
    pub fn filter_pictures(&self, filter: &FilterExpr) -> Result<BTreeSet<PictureId>, DbError> {
        Ok(match filter {
            FilterExpr::Everything => self.picture_ids()?,
            FilterExpr::Nothing => BTreeSet::new(),
            FilterExpr::Has(tag) => self.pictures_with(*tag)?,
            FilterExpr::Lacks(tag) => self.pictures_without(*tag)?,
            FilterExpr::AnyOf { tags, lacking } => {
                let mut ids = BTreeSet::new();
                for tag in tags {
                    ids.extend(self.pictures_with(*tag)?);
                }
                if let Some(tag) = lacking {
                    ids.extend(self.pictures_without(*tag)?);
                }
                ids
            }
        })
    }

    /// Resolved tag sets of every picture, untagged pictures included
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or stored data is corrupt.
    pub fn all_tag_id_sets(&self) -> Result<Vec<TagIdSet>, DbError> {
        let mut sets: BTreeMap<PictureId, TagIdSet> = self
            .picture_ids()?
            .into_iter()
            .map(|id| (id, TagIdSet::for_picture(id)))
            .collect();
        for set in TagIdSet::from_rows(self.associations()?) {
            if let Some(id) = set.picture() {
                sets.insert(id, set);
            }
        }
        Ok(sets.into_values().collect())
    }

    fn scan_pictures(&self, query: &Query) -> Result<BTreeSet<PictureId>, DbError> {
        let sets = self.all_tag_id_sets()?;
        Ok(sets
            .into_par_iter()
            .filter(|tags| query.matches(tags))
            .filter_map(|tags| tags.picture())
            .collect())
    }

    fn picture_ids(&self) -> Result<BTreeSet<PictureId>, DbError> {
        self.pictures
            .iter()
            .keys()
            .map(|key| -> Result<PictureId, DbError> { Ok(PictureId(types::read_id(&key?)?)) })
            .collect()
    }

    fn pictures_with(&self, tag: TagId) -> Result<BTreeSet<PictureId>, DbError> {
        self.tag_index
            .scan_prefix(IndexKey::prefix(tag))
            .keys()
            .map(|key| -> Result<PictureId, DbError> { Ok(IndexKey::from_bytes(&key?)?.picture) })
            .collect()
    }

    fn pictures_without(&self, tag: TagId) -> Result<BTreeSet<PictureId>, DbError> {
        let with = self.pictures_with(tag)?;
        Ok(self
            .picture_ids()?
            .into_iter()
            .filter(|id| !with.contains(id))
            .collect())
    }
}

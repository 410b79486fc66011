//! Key and value encoding for the sled trees
//!
//! Integer ids are stored big-endian so that sled's lexicographic key order
//! matches numeric order. Composite keys concatenate their parts:
//!
//! - **`AssociationKey`**: `picture ‖ slot ‖ tag`, so a prefix scan over one
//!   picture yields its rows ordered by slot
//! - **`IndexKey`**: `tag ‖ picture`, the reverse index used by flat filters
//!
//! # Examples
//!
//! ```
//! use pictag::db::types::AssociationKey;
//! use pictag::tags::TagId;
//! use pictag::tagset::PictureId;
//!
//! let key = AssociationKey { picture: PictureId(7), slot: 1, tag: TagId::new(3).unwrap() };
//! let bytes = key.to_bytes();
//! assert_eq!(AssociationKey::from_bytes(&bytes).unwrap(), key);
//! ```

use bincode::{Decode, Encode};

use super::error::DbError;
use crate::tags::TagId;
use crate::tagset::{AssociationRow, PictureId};

/// Big-endian bytes of an id
#[must_use]
pub const fn id_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

/// Read a big-endian id from the start of `bytes`
///
/// # Errors
///
/// Returns `DbError::CorruptEntry` if fewer than 8 bytes are available.
pub fn read_id(bytes: &[u8]) -> Result<u64, DbError> {
    bytes
        .get(..8)
        .and_then(|head| <[u8; 8]>::try_from(head).ok())
        .map(u64::from_be_bytes)
        .ok_or_else(|| DbError::CorruptEntry(format!("id of {} bytes", bytes.len())))
}

/// Read a stored tag id, rejecting zero
///
/// # Errors
///
/// Returns `DbError::CorruptEntry` for short input or a zero id.
pub fn read_tag_id(bytes: &[u8]) -> Result<TagId, DbError> {
    let raw = read_id(bytes)?;
    TagId::new(raw).ok_or_else(|| DbError::CorruptEntry("tag id 0".to_string()))
}

/// Key of one picture ↔ tag association in the `tagmap` tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociationKey {
    pub picture: PictureId,
    pub slot: u32,
    pub tag: TagId,
}

impl AssociationKey {
    pub const LEN: usize = 20;

    /// Prefix shared by all rows of one picture
    #[must_use]
    pub const fn prefix(picture: PictureId) -> [u8; 8] {
        id_key(picture.0)
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut bytes = [0; Self::LEN];
        bytes[..8].copy_from_slice(&id_key(self.picture.0));
        bytes[8..12].copy_from_slice(&self.slot.to_be_bytes());
        bytes[12..].copy_from_slice(&id_key(self.tag.get()));
        bytes
    }

    /// # Errors
    ///
    /// Returns `DbError::CorruptEntry` if the key is not 20 bytes or holds a zero tag id.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DbError> {
        if bytes.len() != Self::LEN {
            return Err(DbError::CorruptEntry(format!(
                "tagmap key of {} bytes",
                bytes.len()
            )));
        }
        let mut slot = [0; 4];
        slot.copy_from_slice(&bytes[8..12]);
        Ok(Self {
            picture: PictureId(read_id(bytes)?),
            slot: u32::from_be_bytes(slot),
            tag: read_tag_id(&bytes[12..])?,
        })
    }
}

impl From<AssociationKey> for AssociationRow {
    fn from(key: AssociationKey) -> Self {
        Self {
            picture: key.picture,
            tag: key.tag,
            slot: key.slot,
        }
    }
}

/// Key of the reverse index: tag → pictures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexKey {
    pub tag: TagId,
    pub picture: PictureId,
}

impl IndexKey {
    pub const LEN: usize = 16;

    /// Prefix shared by all pictures carrying one tag
    #[must_use]
    pub const fn prefix(tag: TagId) -> [u8; 8] {
        id_key(tag.get())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut bytes = [0; Self::LEN];
        bytes[..8].copy_from_slice(&id_key(self.tag.get()));
        bytes[8..].copy_from_slice(&id_key(self.picture.0));
        bytes
    }

    /// # Errors
    ///
    /// Returns `DbError::CorruptEntry` if the key is not 16 bytes or holds a zero tag id.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DbError> {
        if bytes.len() != Self::LEN {
            return Err(DbError::CorruptEntry(format!(
                "index key of {} bytes",
                bytes.len()
            )));
        }
        Ok(Self {
            tag: read_tag_id(bytes)?,
            picture: PictureId(read_id(&bytes[8..])?),
        })
    }
}

/// Encode a value with the standard bincode configuration
///
/// # Errors
///
/// Returns `DbError::EncodeError` if encoding fails.
pub fn encode<T: Encode>(value: &T) -> Result<Vec<u8>, DbError> {
    Ok(bincode::encode_to_vec(value, bincode::config::standard())?)
}

/// Decode a value written by [`encode`]
///
/// # Errors
///
/// Returns `DbError::DecodeError` if the bytes do not decode.
pub fn decode<T: Decode<()>>(bytes: &[u8]) -> Result<T, DbError> {
    let (value, _): (T, usize) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(value)
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

//! Tag and remove commands

use crate::db::{Database, PictureRecord};
use crate::tagset::TagSet;
use crate::{PictagError, output};

type Result<T> = std::result::Result<T, PictagError>;

/// Create or retag a picture, returning the stored record and derived tags
///
/// # Errors
/// Returns an error if the tag string is invalid or database operations fail
pub fn tag_picture(db: &mut Database, name: &str, tags: &str) -> Result<(PictureRecord, TagSet)> {
    let record = match db.find_picture(name)? {
        Some(existing) => {
            db.set_tags(existing.id, tags)?;
            db.get_picture(existing.id)?
                .ok_or_else(|| PictagError::InvalidInput(format!("Picture '{name}' vanished")))?
        }
        None => db.add_picture(name, tags)?,
    };
    let derived = db.load_tag_id_set(record.id)?.to_tag_set(&*db)?;
    Ok((record, derived))
}

/// Execute the tag command
///
/// # Errors
/// Returns an error if the tag string is invalid or database operations fail
pub fn execute(db: &mut Database, name: &str, tags: &str, quiet: bool) -> Result<()> {
    let (record, derived) = tag_picture(db, name, tags)?;
    if !quiet {
        println!("Tagged {} with: {}", record.name, output::tag_set(&derived));
    }
    Ok(())
}

/// Execute the remove command
///
/// # Errors
/// Returns an error if the picture does not exist or database operations fail
pub fn remove(db: &Database, name: &str, quiet: bool) -> Result<()> {
    let record = db
        .find_picture(name)?
        .ok_or_else(|| PictagError::InvalidInput(format!("No picture named '{name}'")))?;
    db.remove_picture(record.id)?;
    if !quiet {
        println!("Removed {}", record.name);
    }
    Ok(())
}

//! List command - list pictures in the database

use crate::{PictagError, db::Database, output};

type Result<T> = std::result::Result<T, PictagError>;

/// Execute the list command
///
/// # Errors
/// Returns an error if database operations fail
pub fn execute(db: &Database, quiet: bool) -> Result<()> {
    let pictures = db.list_pictures()?;

    if pictures.is_empty() {
        if !quiet {
            println!("No pictures found in database.");
        }
    } else {
        if !quiet {
            println!("Pictures in database:");
        }
        for record in &pictures {
            println!("{}", output::picture_with_tags(record, quiet));
        }
    }
    Ok(())
}

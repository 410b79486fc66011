//! Show command - print one picture's tags

use serde::Serialize;

use crate::db::Database;
use crate::tagset::{PictureId, TagSet};
use crate::{PictagError, output};

type Result<T> = std::result::Result<T, PictagError>;

/// A picture as printed by `show`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PictureView {
    pub id: PictureId,
    pub name: String,
    /// The tag string as entered
    pub tags: String,
    /// Stored tags after alias resolution and implication rules
    pub resolved: TagSet,
}

/// Load a picture by name
///
/// # Errors
/// Returns `PictagError::InvalidInput` for unknown pictures, or database errors
pub fn view(db: &Database, name: &str) -> Result<PictureView> {
    let record = db
        .find_picture(name)?
        .ok_or_else(|| PictagError::InvalidInput(format!("No picture named '{name}'")))?;
    let resolved = db.load_tag_id_set(record.id)?.to_tag_set(db)?;
    Ok(PictureView {
        id: record.id,
        name: record.name,
        tags: record.tags,
        resolved,
    })
}

/// Execute the show command
///
/// # Errors
/// Returns an error if the picture does not exist or output fails
pub fn execute(db: &Database, name: &str, json: bool, quiet: bool) -> Result<()> {
    let view = view(db, name)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else if quiet {
        println!("{}", view.resolved);
    } else {
        println!("Picture:  {} (#{})", view.name, view.id);
        println!("Tagged:   {}", view.tags);
        println!("Resolved: {}", output::tag_set(&view.resolved));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleRow;
    use crate::testing::TestDb;

    #[test]
    fn test_view_includes_derived_tags() {
        let mut test_db = TestDb::new("cmd_show");
        let db = test_db.db_mut();
        db.add_alias("kitty", "cat").unwrap();
        db.replace_rules(&[RuleRow {
            trigger: "cat".to_string(),
            consequence: "animal".to_string(),
            order: 0,
        }])
        .unwrap();
        db.add_picture("pic", "kitty, [ball]").unwrap();

        let view = view(test_db.db(), "pic").unwrap();
        assert_eq!(view.tags, "kitty, [ball]");
        assert_eq!(view.resolved.to_string(), "cat, animal, [ball]");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["name"], "pic");
        assert_eq!(json["resolved"]["slots"][0][1], "animal");
    }

    #[test]
    fn test_view_unknown_picture() {
        let test_db = TestDb::new("cmd_show_missing");
        assert!(matches!(
            view(test_db.db(), "nope"),
            Err(PictagError::InvalidInput(_))
        ));
    }
}

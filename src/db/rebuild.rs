//! Recompute every picture's associations from its stored tag string
//!
//! Needed after the rules or aliases change: derived tags and alias
//! resolution are baked into the stored associations at tagging time.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use super::{Database, DbError};
use crate::tagset::TagSet;

/// Outcome of a rebuild run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    pub total: usize,
    pub processed: usize,
    pub cancelled: bool,
}

impl Database {
    /// Re-derive the associations of every picture
    ///
    /// The rules are loaded once. `cancel` is polled before each picture;
    /// pictures processed before cancellation keep their new associations.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if a picture cannot be read, its stored tag string
    /// no longer validates, or writing the associations fails.
    pub fn rebuild(&mut self, cancel: &AtomicBool) -> Result<RebuildReport, DbError> {
        let rules = self.load_implications()?;
        let pictures = self.list_pictures()?;
        let mut report = RebuildReport {
            total: pictures.len(),
            ..RebuildReport::default()
        };
        info!(pictures = report.total, rules = rules.len(), "Rebuilding associations");

        for record in pictures {
            if cancel.load(Ordering::Relaxed) {
                report.cancelled = true;
                info!(processed = report.processed, total = report.total, "Rebuild cancelled");
                return Ok(report);
            }

            let tagset = TagSet::parse(&record.tags);
            let tags = self.derive_tags(record.id, &tagset, &rules)?;
            self.save_tag_id_set(&tags)?;
            report.processed += 1;
            debug!(picture = %record.id, name = %record.name, tags = tags.total_count(), "Rebuilt picture");
        }

        self.flush()?;
        info!(processed = report.processed, "Rebuild finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleRow;
    use crate::tags::TagRegistry;
    use crate::testing::TestDb;

    fn rule(order: u32, trigger: &str, consequence: &str) -> RuleRow {
        RuleRow {
            trigger: trigger.to_string(),
            consequence: consequence.to_string(),
            order,
        }
    }

    #[test]
    fn test_rebuild_applies_new_rules() {
        let mut test_db = TestDb::new("rebuild_rules");
        let db = test_db.db_mut();
        let record = db.add_picture("pic", "kitten").unwrap();
        assert_eq!(db.load_tag_id_set(record.id).unwrap().total_count(), 1);

        db.replace_rules(&[rule(0, "kitten", "cat"), rule(1, "cat", "animal")])
            .unwrap();
        let report = db.rebuild(&AtomicBool::new(false)).unwrap();
        assert_eq!(
            report,
            RebuildReport {
                total: 1,
                processed: 1,
                cancelled: false
            }
        );

        let tags = db.load_tag_id_set(record.id).unwrap();
        let animal = db.get("animal").unwrap().unwrap();
        assert!(tags.contains(0, animal));
        assert_eq!(tags.total_count(), 3);
    }

    #[test]
    fn test_rebuild_resolves_new_aliases() {
        let mut test_db = TestDb::new("rebuild_aliases");
        let db = test_db.db_mut();
        let record = db.add_picture("pic", "kitty").unwrap();
        let kitty = db.get("kitty").unwrap().unwrap();

        db.add_alias("kitty", "cat").unwrap();
        db.rebuild(&AtomicBool::new(false)).unwrap();

        let tags = db.load_tag_id_set(record.id).unwrap();
        let cat = db.get("cat").unwrap().unwrap();
        assert_ne!(cat, kitty);
        assert_eq!(tags.tags(0), [cat]);
    }

    #[test]
    fn test_rebuild_drops_removed_rule_output() {
        let mut test_db = TestDb::new("rebuild_removed");
        let db = test_db.db_mut();
        db.replace_rules(&[rule(0, "kitten", "cat")]).unwrap();
        let record = db.add_picture("pic", "kitten").unwrap();
        assert_eq!(db.load_tag_id_set(record.id).unwrap().total_count(), 2);

        db.replace_rules(&[]).unwrap();
        db.rebuild(&AtomicBool::new(false)).unwrap();
        assert_eq!(db.load_tag_id_set(record.id).unwrap().total_count(), 1);
    }

    #[test]
    fn test_rebuild_cancelled_up_front() {
        let mut test_db = TestDb::new("rebuild_cancel");
        let db = test_db.db_mut();
        db.add_picture("a", "x").unwrap();
        db.add_picture("b", "y").unwrap();

        let report = db.rebuild(&AtomicBool::new(true)).unwrap();
        assert!(report.cancelled);
        assert_eq!(report.total, 2);
        assert_eq!(report.processed, 0);
    }
}

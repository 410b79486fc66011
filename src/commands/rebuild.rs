//! Rebuild command - re-derive every picture's associations

use colored::Colorize;
use std::sync::atomic::AtomicBool;

use crate::db::{Database, RebuildReport};
use crate::PictagError;

type Result<T> = std::result::Result<T, PictagError>;

/// Execute the rebuild command
///
/// `cancel` is the flag the Ctrl-C handler sets.
///
/// # Errors
/// Returns an error if database operations fail
pub fn execute(db: &mut Database, cancel: &AtomicBool, quiet: bool) -> Result<RebuildReport> {
    if !quiet {
        println!("Rebuilding {} picture(s)...", db.count());
    }
    let report = db.rebuild(cancel)?;

    if !quiet {
        if report.cancelled {
            println!(
                "{} Cancelled after {} of {} picture(s)",
                "!".yellow().bold(),
                report.processed,
                report.total
            );
        } else {
            println!("{} Rebuilt {} picture(s)", "✓".green().bold(), report.processed);
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestDb;

    #[test]
    fn test_execute_reports() {
        let mut test_db = TestDb::new("cmd_rebuild");
        test_db.db_mut().add_picture("pic", "cat").unwrap();

        let report = execute(test_db.db_mut(), &AtomicBool::new(false), true).unwrap();
        assert_eq!(report.processed, 1);
        assert!(!report.cancelled);
    }
}

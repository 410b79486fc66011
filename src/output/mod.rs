//! Output formatting for CLI display

use colored::Colorize;

use crate::db::PictureRecord;
use crate::query::FilterExpr;
use crate::tagset::TagSet;

/// Tag set with groups highlighted
#[must_use]
pub fn tag_set(tags: &TagSet) -> String {
    let mut parts: Vec<String> = tags.tags(0).to_vec();
    for slot in 1..tags.slot_count() {
        parts.push(format!("[{}]", tags.tags(slot).join(", ")).cyan().to_string());
    }
    parts.join(", ")
}

/// Format a picture with its stored tag string for display
#[must_use]
pub fn picture_with_tags(record: &PictureRecord, quiet: bool) -> String {
    if quiet {
        record.name.clone()
    } else if record.tags.is_empty() {
        format!("  {} {}", record.name, "(no tags)".dimmed())
    } else {
        format!("  {} [{}]", record.name, record.tags)
    }
}

/// One-line description of how a query will be evaluated
#[must_use]
pub fn evaluation(filter: Option<&FilterExpr>) -> String {
    match filter {
        Some(filter) => format!("{} {}", "index:".green(), filter),
        None => "full scan".yellow().to_string(),
    }
}

//! Rules commands - import and list implication rules

use colored::Colorize;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::io;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use crate::cli::RulesCommands;
use crate::commands::rebuild;
use crate::db::Database;
use crate::rules::load_rule_file;
use crate::PictagError;

type Result<T> = std::result::Result<T, PictagError>;

/// Counts reported by an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub aliases: usize,
    pub rules: usize,
    /// Rules stored but rejected when bound
    pub dropped: usize,
}

/// Execute rules management commands
///
/// # Errors
/// Returns error if the rule file is invalid or database operations fail
pub fn execute(
    db: &mut Database,
    command: &RulesCommands,
    confirm_rebuild: bool,
    cancel: &AtomicBool,
    quiet: bool,
) -> Result<()> {
    match command {
        RulesCommands::Import { file, yes } => {
            let summary = import(db, file)?;
            if !quiet {
                println!(
                    "{} Imported {} alias(es) and {} rule(s) from {}",
                    "✓".green().bold(),
                    summary.aliases,
                    summary.rules,
                    file.display()
                );
            }
            if db.count() > 0 && confirm(*yes || !confirm_rebuild)? {
                rebuild::execute(db, cancel, quiet)?;
            }
            Ok(())
        }
        RulesCommands::List => list(db, quiet),
    }
}

/// Replace the stored aliases and rules with the contents of `file`
///
/// Aliases are validated before anything is written. Rules that do not bind
/// are stored anyway and reported as dropped, matching what every later
/// load will do with them.
///
/// # Errors
/// Returns `PictagError::RuleFileError` for malformed files, or database errors
pub fn import(db: &mut Database, file: &Path) -> Result<ImportSummary> {
    let rule_file = load_rule_file(file)?;
    db.replace_aliases(&rule_file.aliases)?;
    db.replace_rules(&rule_file.rules)?;

    let implications = db.load_implications()?;
    for error in implications.dropped() {
        eprintln!("{} {error}", "warning:".yellow().bold());
    }
    Ok(ImportSummary {
        aliases: rule_file.aliases.len(),
        rules: rule_file.rules.len(),
        dropped: implications.dropped().len(),
    })
}

fn confirm(skip_prompt: bool) -> Result<bool> {
    if skip_prompt {
        return Ok(true);
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Rebuild existing pictures with the new rules?")
        .default(true)
        .interact()
        .map_err(|e| PictagError::IoError(io::Error::other(e)))
}

fn list(db: &Database, quiet: bool) -> Result<()> {
    let rows = db.rule_rows()?;
    if rows.is_empty() {
        if !quiet {
            println!("{}", "No rules defined".dimmed());
        }
        return Ok(());
    }
    for row in &rows {
        if quiet {
            println!("{} --> {}", row.trigger, row.consequence);
        } else {
            println!(
                "  {:>4}  {} {} {}",
                row.order.to_string().dimmed(),
                row.trigger.cyan(),
                "-->".dimmed(),
                row.consequence.yellow()
            );
        }
    }
    Ok(())
}

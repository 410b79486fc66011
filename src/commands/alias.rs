//! Alias commands

use colored::Colorize;

use crate::cli::AliasCommands;
use crate::{PictagError, db::Database};

type Result<T> = std::result::Result<T, PictagError>;

/// Execute alias management commands
///
/// Stored associations keep the tags they were resolved to; run `rebuild`
/// for an alias change to reach already tagged pictures.
///
/// # Errors
/// Returns error if the alias is rejected or database operations fail
pub fn execute(db: &Database, command: &AliasCommands, quiet: bool) -> Result<()> {
    match command {
        AliasCommands::Add { alias, tag } => {
            db.add_alias(alias, tag)?;
            if !quiet {
                println!(
                    "{} Added alias: {} {} {}",
                    "✓".green().bold(),
                    alias.cyan(),
                    "→".dimmed(),
                    tag.yellow()
                );
            }
        }
        AliasCommands::Remove { alias } => {
            let canonical = db.remove_alias(alias)?;
            if !quiet {
                println!(
                    "{} Removed alias: {} {} {}",
                    "✓".green().bold(),
                    alias.cyan(),
                    "→".dimmed(),
                    canonical.yellow()
                );
            }
        }
        AliasCommands::List => list_aliases(db, quiet)?,
    }
    Ok(())
}

fn list_aliases(db: &Database, quiet: bool) -> Result<()> {
    let aliases = db.list_aliases()?;

    if aliases.is_empty() {
        if !quiet {
            println!("{}", "No aliases defined".dimmed());
        }
        return Ok(());
    }

    if quiet {
        for (alias, canonical) in &aliases {
            println!("{alias} = {canonical}");
        }
        return Ok(());
    }

    println!("{}", "Aliases:".bold());
    println!();

    let max_alias_len = aliases
        .iter()
        .map(|(alias, _)| alias.len())
        .max()
        .unwrap_or(0);

    for (alias, canonical) in &aliases {
        println!(
            "  {:<width$} {} {}",
            alias.cyan(),
            "→".dimmed(),
            canonical.yellow(),
            width = max_alias_len
        );
    }

    println!();
    println!("{} aliases total", aliases.len().to_string().bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;
    use crate::tags::RegistryError;
    use crate::testing::TestDb;

    #[test]
    fn test_add_list_remove() {
        let test_db = TestDb::new("cmd_alias");
        let db = test_db.db();

        let add = AliasCommands::Add {
            alias: "Kitty".to_string(),
            tag: "cat".to_string(),
        };
        execute(db, &add, true).unwrap();
        execute(db, &AliasCommands::List, true).unwrap();
        assert_eq!(db.list_aliases().unwrap().len(), 1);

        let remove = AliasCommands::Remove {
            alias: "kitty".to_string(),
        };
        execute(db, &remove, true).unwrap();
        assert!(db.list_aliases().unwrap().is_empty());
    }

    #[test]
    fn test_remove_unknown_alias() {
        let test_db = TestDb::new("cmd_alias_unknown");
        let remove = AliasCommands::Remove {
            alias: "ghost".to_string(),
        };
        assert!(matches!(
            execute(test_db.db(), &remove, true),
            Err(PictagError::DbError(DbError::Registry(RegistryError::AliasNotFound(_))))
        ));
    }
}

//! Command-line interface definitions and parsing
//!
//! This module defines the CLI structure for pictag using the `clap` crate.
//!
//! # Commands
//!
//! - **parse**: Show how a query is read and whether it can use the index
//! - **tag**: Create or retag a picture
//! - **show** / **list** / **remove**: Inspect and delete pictures
//! - **search**: Find pictures matching a query
//! - **rules**: Import and list implication rules
//! - **alias**: Manage tag aliases
//! - **rebuild**: Re-derive all stored associations
//!
//! # Examples
//!
//! ```
//! use clap::Parser;
//! use pictag::cli::{Cli, Commands};
//!
//! let cli = Cli::parse_from(["pictag", "search", "cat, !dog"]);
//! assert!(matches!(cli.command, Commands::Search { .. }));
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure for parsing command-line arguments
#[derive(Parser, Debug)]
#[command(name = "pictag")]
#[command(about = "Tag pictures and search them with tag queries", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database directory (overrides config)
    #[arg(long = "db", value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// Suppress informational output (only print results)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Parse a query and print its canonical form
    #[command(visible_alias = "p")]
    Parse {
        /// Query text, e.g. "cat, [kitten] | !dog"
        query: String,
    },

    /// Create a picture or replace its tags
    #[command(visible_alias = "t")]
    Tag {
        /// Picture name
        name: String,

        /// Tag string, e.g. "cat, [kitten, fluffy]"
        tags: String,
    },

    /// Show a picture's stored and resolved tags
    Show {
        /// Picture name
        name: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List all pictures
    #[command(visible_alias = "ls")]
    List,

    /// Remove a picture and its tags
    #[command(visible_alias = "rm")]
    Remove {
        /// Picture name
        name: String,
    },

    /// Find pictures matching a query
    #[command(visible_alias = "s")]
    Search {
        /// Query text; empty matches every picture
        #[arg(default_value = "")]
        query: String,

        /// Print JSON instead of names
        #[arg(long)]
        json: bool,
    },

    /// Manage implication rules
    #[command(subcommand)]
    Rules(RulesCommands),

    /// Manage tag aliases
    #[command(subcommand)]
    Alias(AliasCommands),

    /// Re-derive every picture's tags from the current rules and aliases
    Rebuild {
        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Rule management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum RulesCommands {
    /// Replace all aliases and rules with the contents of a rule file
    Import {
        /// Rule file to load
        file: PathBuf,

        /// Rebuild afterwards without asking
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List the stored rules in application order
    #[command(visible_alias = "ls")]
    List,
}

/// Alias management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AliasCommands {
    /// Make ALIAS resolve to TAG
    Add {
        alias: String,
        tag: String,
    },

    /// Remove an alias
    #[command(visible_alias = "rm")]
    Remove {
        alias: String,
    },

    /// List all aliases
    #[command(visible_alias = "ls")]
    List,
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag() {
        let cli = Cli::parse_from(["pictag", "tag", "cat.jpg", "cat, [kitten]"]);
        match cli.command {
            Commands::Tag { name, tags } => {
                assert_eq!(name, "cat.jpg");
                assert_eq!(tags, "cat, [kitten]");
            }
            other => panic!("Expected Tag command, got {other:?}"),
        }
    }

    #[test]
    fn test_search_defaults_to_empty_query() {
        let cli = Cli::parse_from(["pictag", "s"]);
        assert!(matches!(cli.command, Commands::Search { ref query, json: false } if query.is_empty()));
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["pictag", "search", "cat", "--db", "/tmp/gallery", "-q", "--json"]);
        assert!(cli.quiet);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/gallery")));
        assert!(matches!(cli.command, Commands::Search { json: true, .. }));
    }

    #[test]
    fn test_rules_import() {
        let cli = Cli::parse_from(["pictag", "rules", "import", "rules.txt", "--yes"]);
        match cli.command {
            Commands::Rules(RulesCommands::Import { file, yes }) => {
                assert_eq!(file, PathBuf::from("rules.txt"));
                assert!(yes);
            }
            other => panic!("Expected rules import, got {other:?}"),
        }
    }

    #[test]
    fn test_alias_commands() {
        let cli = Cli::parse_from(["pictag", "alias", "add", "kitty", "cat"]);
        assert!(matches!(
            cli.command,
            Commands::Alias(AliasCommands::Add { ref alias, ref tag }) if alias == "kitty" && tag == "cat"
        ));

        let cli = Cli::parse_from(["pictag", "alias", "rm", "kitty"]);
        assert!(matches!(cli.command, Commands::Alias(AliasCommands::Remove { .. })));
    }

    #[test]
    fn test_query_may_start_with_bang() {
        let cli = Cli::parse_from(["pictag", "search", "!dog"]);
        assert!(matches!(cli.command, Commands::Search { ref query, .. } if query == "!dog"));
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["pictag"]).is_err());
    }
}

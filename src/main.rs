//! Pictag CLI application entry point
//!
//! # Usage
//!
//! ```bash
//! # Tag a picture; groups describe one thing in the picture each
//! pictag tag cat.jpg "cat, [kitten, fluffy]"
//!
//! # Search with a tag query
//! pictag search "cat, [kitten] | dog"
//! pictag search "!cat" --json
//!
//! # See how a query is read and whether it can use the index
//! pictag parse "cat | !dog"
//!
//! # Load aliases and implication rules, then re-derive stored tags
//! pictag rules import pets.rules
//! pictag rebuild
//!
//! # Quiet mode (only output results)
//! pictag -q search cat
//! ```
//!
//! # Configuration
//!
//! Configuration is stored in the user's config directory
//! (`~/.config/pictag/config.toml` on Linux) and created with defaults on
//! first run. `RUST_LOG` overrides the configured `log_level`.

use pictag::{
    PictagError,
    cli::{Cli, Commands},
    commands,
    config::PictagConfig,
    db::Database,
};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

type Result<T> = std::result::Result<T, PictagError>;

fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .init();
}

/// Install a Ctrl-C handler that asks long operations to stop
fn cancellation_flag() -> Result<Arc<AtomicBool>> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .map_err(|e| PictagError::IoError(io::Error::other(e)))?;
    Ok(cancel)
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let config = PictagConfig::load()?;
    init_tracing(&config.log_level);

    let quiet = cli.quiet || config.quiet;

    // Parsing needs no database
    if let Commands::Parse { query } = &cli.command {
        return commands::parse(query, quiet);
    }

    let db_path = config.database_path(cli.db.as_deref())?;
    debug!(path = %db_path.display(), "Opening database");
    let mut db = Database::open(&db_path)?;

    match &cli.command {
        Commands::Parse { .. } => Ok(()),
        Commands::Tag { name, tags } => commands::tag(&mut db, name, tags, quiet),
        Commands::Show { name, json } => commands::show(&db, name, *json, quiet),
        Commands::List => commands::list(&db, quiet),
        Commands::Remove { name } => commands::tag::remove(&db, name, quiet),
        Commands::Search { query, json } => commands::search(&db, query, *json, quiet),
        Commands::Alias(command) => commands::alias(&db, command, quiet),
        Commands::Rules(command) => {
            let cancel = cancellation_flag()?;
            commands::rules(&mut db, command, config.confirm_rebuild, &cancel, quiet)
        }
        Commands::Rebuild { yes } => {
            if !*yes && config.confirm_rebuild && !quiet && !confirm_rebuild()? {
                return Ok(());
            }
            let cancel = cancellation_flag()?;
            commands::rebuild(&mut db, &cancel, quiet).map(|_| ())
        }
    }
}

fn confirm_rebuild() -> Result<bool> {
    dialoguer::Confirm::with_theme(&dialoguer::theme::ColorfulTheme::default())
        .with_prompt("Re-derive the tags of every picture?")
        .default(true)
        .interact()
        .map_err(|e| PictagError::IoError(io::Error::other(e)))
}

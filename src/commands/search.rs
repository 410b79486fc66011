//! Search command - find pictures matching a tag query

use tracing::debug;

use crate::db::{Database, PictureRecord};
use crate::query::Query;
use crate::{PictagError, output};

type Result<T> = std::result::Result<T, PictagError>;

/// Parse and run a query
///
/// # Errors
/// Returns `PictagError::ParseError` for malformed queries, or database errors
pub fn run(db: &Database, text: &str) -> Result<Vec<PictureRecord>> {
    let query = Query::parse(text)?;
    let results = db.search(&query)?;
    debug!(query = %query, results = results.len(), "Search finished");
    Ok(results)
}

/// Execute the search command
///
/// # Errors
/// Returns an error if the query is malformed, database operations fail or
/// JSON output fails
pub fn execute(db: &Database, text: &str, json: bool, quiet: bool) -> Result<()> {
    let results = run(db, text)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        if !quiet {
            println!("No pictures match '{text}'.");
        }
        return Ok(());
    }

    if !quiet {
        println!("Pictures matching '{text}':");
    }
    for record in &results {
        println!("{}", output::picture_with_tags(record, quiet));
    }
    if !quiet {
        println!("{} picture(s)", results.len());
    }
    Ok(())
}

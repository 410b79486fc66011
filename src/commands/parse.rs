//! Parse command - show how a query is read

use serde::Serialize;

use crate::query::{FilterExpr, Query};
use crate::{PictagError, output};

type Result<T> = std::result::Result<T, PictagError>;

/// What the parser and the flat translator make of a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuerySummary {
    pub canonical: String,
    pub trivial: bool,
    pub uses_groups: bool,
    /// `None` when the query needs a full scan
    pub filter: Option<FilterExpr>,
    /// Why no filter is available
    pub reason: Option<String>,
}

/// Summarize a query without touching any database
///
/// Every tag is treated as known, so the filter shows the shape the
/// index lookup would take.
///
/// # Errors
/// Returns `PictagError::ParseError` for malformed queries
pub fn describe(text: &str) -> Result<QuerySummary> {
    let mut query = Query::parse(text)?;
    let mut registry = crate::tags::MemoryRegistry::new();
    query.bind_or_create(&mut registry)?;

    let (filter, reason) = match query.to_flat_filter() {
        Ok(filter) => (Some(filter), None),
        Err(reason) => (None, Some(reason.to_string())),
    };
    Ok(QuerySummary {
        canonical: query.to_string(),
        trivial: query.is_trivial(),
        uses_groups: query.uses_groups(),
        filter,
        reason,
    })
}

/// Execute the parse command
///
/// # Errors
/// Returns an error if the query does not parse
pub fn execute(text: &str, quiet: bool) -> Result<()> {
    let summary = describe(text)?;
    if quiet {
        println!("{}", summary.canonical);
        return Ok(());
    }

    println!("Query:   {}", summary.canonical);
    println!("Trivial: {}", summary.trivial);
    println!("Groups:  {}", summary.uses_groups);
    println!("Search:  {}", output::evaluation(summary.filter.as_ref()));
    if let Some(reason) = summary.reason {
        println!("         ({reason})");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_trivial_query() {
        let summary = describe("cat|dog|!fox").unwrap();
        assert_eq!(summary.canonical, "cat | dog | !fox");
        assert!(summary.trivial);
        assert!(!summary.uses_groups);
        assert!(matches!(summary.filter, Some(FilterExpr::AnyOf { ref tags, lacking: Some(_) }) if tags.len() == 2));
        assert!(summary.reason.is_none());
    }

    #[test]
    fn test_describe_grouped_query() {
        let summary = describe("cat,[kitten]").unwrap();
        assert_eq!(summary.canonical, "cat, [kitten]");
        assert!(!summary.trivial);
        assert!(summary.uses_groups);
        assert!(summary.filter.is_none());
        assert!(summary.reason.is_some());
    }

    #[test]
    fn test_describe_empty_query() {
        let summary = describe("").unwrap();
        assert_eq!(summary.canonical, "");
        assert_eq!(summary.filter, Some(FilterExpr::Everything));
    }

    #[test]
    fn test_describe_rejects_bad_query() {
        assert!(matches!(describe("cat,,dog"), Err(PictagError::ParseError(_))));
    }
}

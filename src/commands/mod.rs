//! Command implementations
//!
//! Each command is a module with an execute function that takes parsed CLI args
//! and executes the operation against the database.

pub mod alias;
pub mod list;
pub mod parse;
pub mod rebuild;
pub mod rules;
pub mod search;
pub mod show;
pub mod tag;

// Re-export execute functions for convenience
pub use alias::execute as alias;
pub use list::execute as list;
pub use parse::execute as parse;
pub use rebuild::execute as rebuild;
pub use rules::execute as rules;
pub use search::execute as search;
pub use show::execute as show;
pub use tag::execute as tag;

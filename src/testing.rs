//! Testing utilities for pictag
//!
//! This module provides helper types and functions for writing tests,
//! including a `TestDb` wrapper for temporary database management.
//!
//! Only available when compiled with `cfg(test)`.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::db::Database;

/// Temporary test database that is deleted on drop
///
/// Every instance lives in its own temporary directory, so tests running in
/// parallel never share a store even when they pass the same name.
pub struct TestDb {
    path: PathBuf,
    db: Database,
    // Dropped after `db`, which flushes into it
    _dir: TempDir,
}

impl TestDb {
    /// Open a fresh database named `name` inside a new temporary directory
    ///
    /// # Panics
    /// Panics if the directory or the database cannot be created.
    pub fn new(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join(name);
        let db = Database::open(&path).expect("Failed to open test database");
        Self { path, db, _dir: dir }
    }

    /// Get a reference to the underlying database
    #[must_use]
    pub const fn db(&self) -> &Database {
        &self.db
    }

    /// Get a mutable reference to the underlying database
    pub fn db_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    /// Get the path to the test database
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write `content` to `name` inside `dir` and return the full path
///
/// # Panics
/// Panics if the file cannot be written.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_basic() {
        let mut test_db = TestDb::new("test_testing_db_basic");
        assert!(test_db.path().exists());
        test_db.db_mut().add_picture("pic", "cat").unwrap();
        assert_eq!(test_db.db().count(), 1);
    }

    #[test]
    fn test_same_name_is_isolated() {
        let mut first = TestDb::new("shared");
        let second = TestDb::new("shared");
        first.db_mut().add_picture("pic", "cat").unwrap();
        assert_eq!(second.db().count(), 0);
        assert_ne!(first.path(), second.path());
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "rules.txt", "a --> b\n");
        assert_eq!(fs::read_to_string(path).unwrap(), "a --> b\n");
    }
}

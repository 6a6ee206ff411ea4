//! SQLite backend configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the SQLite connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Database file path, or `:memory:` for an in-memory database
    pub path: PathBuf,

    /// Use WAL journaling for concurrent readers
    pub wal_mode: bool,

    /// Enforce foreign keys (the tags table relies on `ON DELETE RESTRICT`)
    pub foreign_keys: bool,

    /// Busy timeout in milliseconds
    pub busy_timeout_ms: u32,
}

impl SqliteConfig {
    /// Configuration for a database file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// In-memory database for testing
    pub fn memory() -> Self {
        Self::new(":memory:")
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("taxa.db"),
            wal_mode: true,
            foreign_keys: true,
            busy_timeout_ms: 5_000,
        }
    }
}

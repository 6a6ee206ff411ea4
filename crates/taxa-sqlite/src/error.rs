//! Error types for SQLite storage

use taxa_core::{ProblemError, TagError};
use thiserror::Error;

/// SQLite storage error type
#[derive(Error, Debug)]
pub enum SqliteError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(String),

    /// Schema/migration error
    #[error("Schema error: {0}")]
    Schema(String),

    /// Underlying rusqlite error
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Result type for SQLite operations
pub type SqliteResult<T> = Result<T, SqliteError>;

impl From<SqliteError> for TagError {
    fn from(err: SqliteError) -> Self {
        TagError::Store(err.to_string())
    }
}

impl From<SqliteError> for ProblemError {
    fn from(err: SqliteError) -> Self {
        ProblemError::Store(err.to_string())
    }
}

/// Map a tokio join failure into a backend error
pub(crate) fn join_error(err: tokio::task::JoinError) -> SqliteError {
    SqliteError::Connection(format!("blocking task failed: {err}"))
}

/// True when a rusqlite error is a UNIQUE/PRIMARY KEY violation. Checks
/// the extended result code so FK and CHECK failures are not mistaken
/// for duplicates.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

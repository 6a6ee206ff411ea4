//! SQLite storage backend for taxa
//!
//! Implements `taxa-core`'s storage traits over rusqlite:
//!
//! - **SqliteTagStore**: the tag hierarchy, adjacency-list table with
//!   `ON DELETE RESTRICT` backing deletion protection and transactional
//!   batch creation backing atomic bulk inserts
//! - **SqliteProblemStore**: problem records plus the problem↔tag join,
//!   with descendant-inclusive tag filtering via a recursive CTE
//! - **WAL mode**: concurrent readers against the single writer
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taxa_core::TagService;
//! use taxa_sqlite::{SqliteConfig, SqlitePool, SqliteTagStore};
//!
//! let pool = SqlitePool::new(SqliteConfig::new("./taxa.db"))?;
//! let service = TagService::new(Arc::new(SqliteTagStore::new(pool)));
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod problem_store;
pub mod schema;
pub mod tag_store;

// Re-exports
pub use config::SqliteConfig;
pub use connection::SqlitePool;
pub use error::{SqliteError, SqliteResult};
pub use problem_store::SqliteProblemStore;
pub use tag_store::SqliteTagStore;

//! TagStore implementation for SQLite
//!
//! rusqlite is synchronous, so every operation hops onto the blocking
//! pool. Batch creation runs inside one transaction, which is what makes
//! `create_many` all-or-nothing even against concurrent same-name
//! creates: the UNIQUE primary key fires inside the transaction and the
//! whole batch rolls back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use taxa_core::{normalize_name, Tag, TagError, TagPatch, TagResult, TagStore};
use tokio::task::spawn_blocking;
use tracing::debug;

use crate::connection::SqlitePool;
use crate::error::{is_unique_violation, join_error, SqliteError};

/// SQLite implementation of the tag store
#[derive(Clone)]
pub struct SqliteTagStore {
    pool: SqlitePool,
}

impl SqliteTagStore {
    /// Create a store over the given pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagStore for SqliteTagStore {
    async fn create(&self, tag: Tag) -> TagResult<String> {
        let pool = self.pool.clone();

        spawn_blocking(move || {
            pool.with_connection(|conn| {
                insert_tag(conn, &tag)?;
                Ok(tag.id.clone())
            })
        })
        .await
        .map_err(|e| TagError::from(join_error(e)))?
    }

    async fn create_many(&self, batch: Vec<Tag>) -> TagResult<Vec<String>> {
        let pool = self.pool.clone();

        spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                let tx = conn
                    .transaction()
                    .map_err(|e| TagError::from(SqliteError::from(e)))?;
                let mut ids = Vec::with_capacity(batch.len());
                for tag in &batch {
                    insert_tag(&tx, tag)?;
                    ids.push(tag.id.clone());
                }
                tx.commit().map_err(|e| TagError::from(SqliteError::from(e)))?;
                debug!(count = ids.len(), "tag batch committed");
                Ok(ids)
            })
        })
        .await
        .map_err(|e| TagError::from(join_error(e)))?
    }

    async fn get(&self, id: &str) -> TagResult<Tag> {
        self.try_get(id)
            .await?
            .ok_or_else(|| TagError::NotFound(id.to_string()))
    }

    async fn try_get(&self, id: &str) -> TagResult<Option<Tag>> {
        let pool = self.pool.clone();
        let id = id.to_string();

        spawn_blocking(move || {
            pool.with_connection(|conn| {
                conn.query_row(
                    "SELECT id, description, use_filter, parent_id, created_at, updated_at
                     FROM tags WHERE id = ?1",
                    [&id],
                    row_to_tag,
                )
                .optional()
                .map_err(|e| TagError::from(SqliteError::from(e)))
            })
        })
        .await
        .map_err(|e| TagError::from(join_error(e)))?
    }

    async fn update(&self, id: &str, patch: TagPatch) -> TagResult<Tag> {
        let pool = self.pool.clone();
        let id = id.to_string();

        spawn_blocking(move || {
            pool.with_connection(|conn| {
                // Read-modify-write under the pool lock; the patch itself
                // owns field semantics.
                let mut tag = conn
                    .query_row(
                        "SELECT id, description, use_filter, parent_id, created_at, updated_at
                         FROM tags WHERE id = ?1",
                        [&id],
                        row_to_tag,
                    )
                    .optional()
                    .map_err(|e| TagError::from(SqliteError::from(e)))?
                    .ok_or_else(|| TagError::NotFound(id.clone()))?;

                patch.apply(&mut tag);

                conn.execute(
                    "UPDATE tags
                     SET description = ?2, use_filter = ?3, parent_id = ?4, updated_at = ?5
                     WHERE id = ?1",
                    params![
                        tag.id,
                        tag.description,
                        tag.use_filter,
                        tag.parent,
                        tag.updated_at.to_rfc3339(),
                    ],
                )
                .map_err(|e| TagError::from(SqliteError::from(e)))?;

                Ok(tag)
            })
        })
        .await
        .map_err(|e| TagError::from(join_error(e)))?
    }

    async fn delete(&self, id: &str) -> TagResult<()> {
        let pool = self.pool.clone();
        let id = id.to_string();

        spawn_blocking(move || {
            pool.with_connection(|conn| {
                let children: usize = conn
                    .query_row(
                        "SELECT COUNT(*) FROM tags WHERE parent_id = ?1",
                        [&id],
                        |row| row.get::<_, i64>(0).map(|n| n as usize),
                    )
                    .map_err(|e| TagError::from(SqliteError::from(e)))?;
                if children > 0 {
                    return Err(TagError::HasChildren { id, children });
                }

                let deleted = conn
                    .execute("DELETE FROM tags WHERE id = ?1", [&id])
                    .map_err(|e| TagError::from(SqliteError::from(e)))?;
                if deleted == 0 {
                    return Err(TagError::NotFound(id));
                }
                Ok(())
            })
        })
        .await
        .map_err(|e| TagError::from(join_error(e)))?
    }

    async fn find_by_name(&self, name: &str) -> TagResult<Tag> {
        let slug = normalize_name(name);
        self.get(&slug).await
    }

    async fn list_children(&self, id: &str) -> TagResult<Vec<Tag>> {
        let pool = self.pool.clone();
        let id = id.to_string();

        spawn_blocking(move || {
            pool.with_connection(|conn| {
                query_tags(
                    conn,
                    "SELECT id, description, use_filter, parent_id, created_at, updated_at
                     FROM tags WHERE parent_id = ?1 ORDER BY id",
                    [&id],
                )
            })
        })
        .await
        .map_err(|e| TagError::from(join_error(e)))?
    }

    async fn list_roots(&self) -> TagResult<Vec<Tag>> {
        let pool = self.pool.clone();

        spawn_blocking(move || {
            pool.with_connection(|conn| {
                query_tags(
                    conn,
                    "SELECT id, description, use_filter, parent_id, created_at, updated_at
                     FROM tags WHERE parent_id IS NULL ORDER BY id",
                    [],
                )
            })
        })
        .await
        .map_err(|e| TagError::from(join_error(e)))?
    }

    async fn list_all(&self) -> TagResult<Vec<Tag>> {
        let pool = self.pool.clone();

        spawn_blocking(move || {
            pool.with_connection(|conn| {
                query_tags(
                    conn,
                    "SELECT id, description, use_filter, parent_id, created_at, updated_at
                     FROM tags ORDER BY id",
                    [],
                )
            })
        })
        .await
        .map_err(|e| TagError::from(join_error(e)))?
    }

    async fn count(&self) -> TagResult<usize> {
        let pool = self.pool.clone();

        spawn_blocking(move || {
            pool.with_connection(|conn| {
                conn.query_row("SELECT COUNT(*) FROM tags", [], |row| {
                    row.get::<_, i64>(0).map(|n| n as usize)
                })
                    .map_err(|e| TagError::from(SqliteError::from(e)))
            })
        })
        .await
        .map_err(|e| TagError::from(join_error(e)))?
    }
}

/// Insert one tag, mapping a primary-key collision to `DuplicateId`
fn insert_tag(conn: &Connection, tag: &Tag) -> TagResult<()> {
    conn.execute(
        "INSERT INTO tags (id, description, use_filter, parent_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            tag.id,
            tag.description,
            tag.use_filter,
            tag.parent,
            tag.created_at.to_rfc3339(),
            tag.updated_at.to_rfc3339(),
        ],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            TagError::DuplicateId(tag.id.clone())
        } else {
            TagError::from(SqliteError::from(e))
        }
    })?;
    Ok(())
}

fn query_tags<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> TagResult<Vec<Tag>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| TagError::from(SqliteError::from(e)))?;
    let tags = stmt
        .query_map(params, row_to_tag)
        .map_err(|e| TagError::from(SqliteError::from(e)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TagError::from(SqliteError::from(e)))?;
    Ok(tags)
}

/// Convert a database row to a Tag
fn row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
    let id: String = row.get(0)?;
    let description: String = row.get(1)?;
    let use_filter: bool = row.get(2)?;
    let parent: Option<String> = row.get(3)?;
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;

    Ok(Tag {
        id,
        description,
        use_filter,
        parent,
        created_at: parse_timestamp(4, &created_at)?,
        updated_at: parse_timestamp(5, &updated_at)?,
    })
}

/// Parse a stored RFC 3339 timestamp; an unparsable value is corrupt
/// data and surfaces as a conversion failure for its column
fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}

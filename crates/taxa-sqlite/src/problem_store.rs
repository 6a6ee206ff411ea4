//! ProblemStore implementation for SQLite
//!
//! Problems are plain records; the only structural query is
//! `problems_with_tag`, which includes descendant tags via a recursive
//! CTE so filtering by an umbrella tag matches its whole subtree.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use taxa_core::{Problem, ProblemError, ProblemResult, ProblemStore};
use tokio::task::spawn_blocking;

use crate::connection::SqlitePool;
use crate::error::{is_unique_violation, join_error, SqliteError};

/// SQLite implementation of the problem store
#[derive(Clone)]
pub struct SqliteProblemStore {
    pool: SqlitePool,
}

impl SqliteProblemStore {
    /// Create a store over the given pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProblemStore for SqliteProblemStore {
    async fn create(&self, problem: Problem) -> ProblemResult<Problem> {
        problem.check_fields()?;
        let pool = self.pool.clone();

        spawn_blocking(move || {
            pool.with_connection(|conn| {
                conn.execute(
                    "INSERT INTO problems
                     (source, author, description, aops_url, git_url,
                      problem_number, hardness, proposal_date, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        problem.source,
                        problem.author,
                        problem.description,
                        problem.aops_url,
                        problem.git_url,
                        problem.problem_number,
                        problem.hardness,
                        problem.proposal_date.map(|d| d.to_string()),
                        problem.created_at.to_rfc3339(),
                        problem.updated_at.to_rfc3339(),
                    ],
                )
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        ProblemError::DuplicateSource(
                            problem.source.clone().unwrap_or_default(),
                        )
                    } else {
                        ProblemError::from(SqliteError::from(e))
                    }
                })?;

                let mut stored = problem.clone();
                stored.id = conn.last_insert_rowid();
                Ok(stored)
            })
        })
        .await
        .map_err(|e| ProblemError::from(join_error(e)))?
    }

    async fn get(&self, id: i64) -> ProblemResult<Problem> {
        let pool = self.pool.clone();

        spawn_blocking(move || {
            pool.with_connection(|conn| {
                conn.query_row(
                    "SELECT id, source, author, description, aops_url, git_url,
                            problem_number, hardness, proposal_date, created_at, updated_at
                     FROM problems WHERE id = ?1",
                    [id],
                    row_to_problem,
                )
                .optional()
                .map_err(|e| ProblemError::from(SqliteError::from(e)))?
                .ok_or(ProblemError::NotFound(id))
            })
        })
        .await
        .map_err(|e| ProblemError::from(join_error(e)))?
    }

    async fn delete(&self, id: i64) -> ProblemResult<()> {
        let pool = self.pool.clone();

        spawn_blocking(move || {
            pool.with_connection(|conn| {
                let deleted = conn
                    .execute("DELETE FROM problems WHERE id = ?1", [id])
                    .map_err(|e| ProblemError::from(SqliteError::from(e)))?;
                if deleted == 0 {
                    return Err(ProblemError::NotFound(id));
                }
                Ok(())
            })
        })
        .await
        .map_err(|e| ProblemError::from(join_error(e)))?
    }

    async fn list(&self) -> ProblemResult<Vec<Problem>> {
        let pool = self.pool.clone();

        spawn_blocking(move || {
            pool.with_connection(|conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT id, source, author, description, aops_url, git_url,
                                problem_number, hardness, proposal_date, created_at, updated_at
                         FROM problems ORDER BY id DESC",
                    )
                    .map_err(|e| ProblemError::from(SqliteError::from(e)))?;
                let problems = stmt
                    .query_map([], row_to_problem)
                    .map_err(|e| ProblemError::from(SqliteError::from(e)))?
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| ProblemError::from(SqliteError::from(e)))?;
                Ok(problems)
            })
        })
        .await
        .map_err(|e| ProblemError::from(join_error(e)))?
    }

    async fn attach_tag(&self, problem_id: i64, tag_id: &str) -> ProblemResult<()> {
        let pool = self.pool.clone();
        let tag_id = tag_id.to_string();

        spawn_blocking(move || {
            pool.with_connection(|conn| {
                ensure_problem(conn, problem_id)?;
                ensure_tag(conn, &tag_id)?;
                conn.execute(
                    "INSERT INTO problem_tags (problem_id, tag_id, created_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(problem_id, tag_id) DO NOTHING",
                    params![problem_id, tag_id, Utc::now().to_rfc3339()],
                )
                .map_err(|e| ProblemError::from(SqliteError::from(e)))?;
                Ok(())
            })
        })
        .await
        .map_err(|e| ProblemError::from(join_error(e)))?
    }

    async fn detach_tag(&self, problem_id: i64, tag_id: &str) -> ProblemResult<()> {
        let pool = self.pool.clone();
        let tag_id = tag_id.to_string();

        spawn_blocking(move || {
            pool.with_connection(|conn| {
                conn.execute(
                    "DELETE FROM problem_tags WHERE problem_id = ?1 AND tag_id = ?2",
                    params![problem_id, tag_id],
                )
                .map_err(|e| ProblemError::from(SqliteError::from(e)))?;
                Ok(())
            })
        })
        .await
        .map_err(|e| ProblemError::from(join_error(e)))?
    }

    async fn tags_of(&self, problem_id: i64) -> ProblemResult<Vec<String>> {
        let pool = self.pool.clone();

        spawn_blocking(move || {
            pool.with_connection(|conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT tag_id FROM problem_tags
                         WHERE problem_id = ?1 ORDER BY tag_id",
                    )
                    .map_err(|e| ProblemError::from(SqliteError::from(e)))?;
                let tags = stmt
                    .query_map([problem_id], |row| row.get(0))
                    .map_err(|e| ProblemError::from(SqliteError::from(e)))?
                    .collect::<Result<Vec<String>, _>>()
                    .map_err(|e| ProblemError::from(SqliteError::from(e)))?;
                Ok(tags)
            })
        })
        .await
        .map_err(|e| ProblemError::from(join_error(e)))?
    }

    async fn problems_with_tag(&self, tag_id: &str) -> ProblemResult<Vec<i64>> {
        let pool = self.pool.clone();
        let tag_id = tag_id.to_string();

        spawn_blocking(move || {
            pool.with_connection(|conn| {
                ensure_tag(conn, &tag_id)?;
                // Tag plus all of its descendants.
                let mut stmt = conn
                    .prepare(
                        "WITH RECURSIVE tag_tree(id) AS (
                             SELECT id FROM tags WHERE id = ?1
                             UNION ALL
                             SELECT t.id FROM tags t
                             JOIN tag_tree tt ON t.parent_id = tt.id
                         )
                         SELECT DISTINCT pt.problem_id
                         FROM problem_tags pt
                         JOIN tag_tree tt ON pt.tag_id = tt.id
                         ORDER BY pt.problem_id",
                    )
                    .map_err(|e| ProblemError::from(SqliteError::from(e)))?;
                let ids = stmt
                    .query_map([&tag_id], |row| row.get(0))
                    .map_err(|e| ProblemError::from(SqliteError::from(e)))?
                    .collect::<Result<Vec<i64>, _>>()
                    .map_err(|e| ProblemError::from(SqliteError::from(e)))?;
                Ok(ids)
            })
        })
        .await
        .map_err(|e| ProblemError::from(join_error(e)))?
    }
}

fn ensure_problem(conn: &Connection, id: i64) -> ProblemResult<()> {
    let exists: Option<i64> = conn
        .query_row("SELECT id FROM problems WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|e| ProblemError::from(SqliteError::from(e)))?;
    exists.map(|_| ()).ok_or(ProblemError::NotFound(id))
}

fn ensure_tag(conn: &Connection, id: &str) -> ProblemResult<()> {
    let exists: Option<String> = conn
        .query_row("SELECT id FROM tags WHERE id = ?1", [id], |row| row.get(0))
        .optional()
        .map_err(|e| ProblemError::from(SqliteError::from(e)))?;
    exists
        .map(|_| ())
        .ok_or_else(|| ProblemError::TagNotFound(id.to_string()))
}

/// Convert a database row to a Problem
fn row_to_problem(row: &rusqlite::Row) -> rusqlite::Result<Problem> {
    let proposal_date: Option<String> = row.get(8)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Problem {
        id: row.get(0)?,
        source: row.get(1)?,
        author: row.get(2)?,
        description: row.get(3)?,
        aops_url: row.get(4)?,
        git_url: row.get(5)?,
        problem_number: row.get(6)?,
        hardness: row.get(7)?,
        proposal_date: proposal_date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        created_at: parse_timestamp(9, &created_at)?,
        updated_at: parse_timestamp(10, &updated_at)?,
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

//! Problem records
//!
//! Problems are thin data records next to the tag engine: descriptive
//! fields, an optional MOHS hardness rating, and a set of tag ids. The
//! only behavior they carry is field validation; classification logic
//! lives entirely in the tag hierarchy.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest MOHS hardness rating
pub const MOHS_MAX: u8 = 60;
/// MOHS ratings move in steps of this size
pub const MOHS_STEP: u8 = 5;
/// Bound on the one-line problem description
pub const MAX_PROBLEM_DESCRIPTION_LEN: usize = 100;

/// Error type for problem records and their storage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProblemError {
    /// MOHS rating above the scale
    #[error("MOHS rating cannot exceed {MOHS_MAX}")]
    HardnessTooHigh(u8),

    /// MOHS rating off the step scale
    #[error("MOHS rating must be a multiple of {MOHS_STEP}")]
    HardnessNotStep(u8),

    /// `source` must be unique when present
    #[error("a problem with source `{0}` already exists")]
    DuplicateSource(String),

    /// The one-line description is required
    #[error("problem description must not be empty")]
    MissingDescription,

    /// Description exceeds the length bound
    #[error("problem description exceeds {MAX_PROBLEM_DESCRIPTION_LEN} characters")]
    DescriptionTooLong,

    /// Referenced problem does not exist
    #[error("no problem with id {0}")]
    NotFound(i64),

    /// A tag referenced in an attach/detach does not exist
    #[error("no tag with id `{0}`")]
    TagNotFound(String),

    /// Storage backend failure
    #[error("storage error: {0}")]
    Store(String),
}

/// Result type for problem operations
pub type ProblemResult<T> = Result<T, ProblemError>;

impl ProblemError {
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Self::Store(msg.into())
    }
}

/// A competition-style mathematics problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Backend-assigned id; 0 until first stored
    #[serde(default)]
    pub id: i64,

    /// Problem source, unique when present, e.g. "IMO 2023/6"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// e.g. "Abel George Mathew (IND)"
    #[serde(default)]
    pub author: String,

    /// Short one-line description of the statement, e.g. "Fiendish inequality"
    pub description: String,

    /// Link to the problem on AoPS, if it exists
    #[serde(default)]
    pub aops_url: String,

    /// Read-only link to pull the problem via git
    #[serde(default)]
    pub git_url: String,

    /// Position within the contest or problem set it appeared in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_number: Option<u32>,

    /// MOHS hardness, 0..=60 in steps of 5; `None` for not-rateable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardness: Option<u8>,

    /// Date of problem creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Problem {
    /// Create a problem with the required one-line description
    pub fn new(description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            source: None,
            author: String::new(),
            description: description.into(),
            aops_url: String::new(),
            git_url: String::new(),
            problem_number: None,
            hardness: None,
            proposal_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_hardness(mut self, hardness: u8) -> Self {
        self.hardness = Some(hardness);
        self
    }

    pub fn with_proposal_date(mut self, date: NaiveDate) -> Self {
        self.proposal_date = Some(date);
        self
    }

    /// Validate field bounds; violations are never silently clamped
    pub fn check_fields(&self) -> ProblemResult<()> {
        if self.description.trim().is_empty() {
            return Err(ProblemError::MissingDescription);
        }
        if self.description.chars().count() > MAX_PROBLEM_DESCRIPTION_LEN {
            return Err(ProblemError::DescriptionTooLong);
        }
        if let Some(hardness) = self.hardness {
            check_hardness(hardness)?;
        }
        Ok(())
    }
}

/// Check a MOHS rating against the scale bounds
pub fn check_hardness(hardness: u8) -> ProblemResult<()> {
    if hardness > MOHS_MAX {
        return Err(ProblemError::HardnessTooHigh(hardness));
    }
    if hardness % MOHS_STEP != 0 {
        return Err(ProblemError::HardnessNotStep(hardness));
    }
    Ok(())
}

/// Storage for problem records and the problem↔tag join
#[async_trait::async_trait]
pub trait ProblemStore: Send + Sync {
    /// Insert a problem and return it with its assigned id
    async fn create(&self, problem: Problem) -> ProblemResult<Problem>;

    /// Fetch a problem by id
    async fn get(&self, id: i64) -> ProblemResult<Problem>;

    /// Remove a problem (its tag associations go with it)
    async fn delete(&self, id: i64) -> ProblemResult<()>;

    /// Every problem, newest first
    async fn list(&self) -> ProblemResult<Vec<Problem>>;

    /// Associate a tag with a problem; idempotent
    async fn attach_tag(&self, problem_id: i64, tag_id: &str) -> ProblemResult<()>;

    /// Remove a tag association
    async fn detach_tag(&self, problem_id: i64, tag_id: &str) -> ProblemResult<()>;

    /// Tag ids attached to a problem, in id order
    async fn tags_of(&self, problem_id: i64) -> ProblemResult<Vec<String>>;

    /// Ids of problems carrying `tag_id` or any of its descendants
    async fn problems_with_tag(&self, tag_id: &str) -> ProblemResult<Vec<i64>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardness_stays_on_the_mohs_scale() {
        assert!(check_hardness(0).is_ok());
        assert!(check_hardness(35).is_ok());
        assert!(check_hardness(60).is_ok());
        assert_eq!(check_hardness(65), Err(ProblemError::HardnessTooHigh(65)));
        assert_eq!(check_hardness(42), Err(ProblemError::HardnessNotStep(42)));
    }

    #[test]
    fn description_is_required_and_bounded() {
        assert_eq!(
            Problem::new("  ").check_fields(),
            Err(ProblemError::MissingDescription)
        );
        assert_eq!(
            Problem::new("x".repeat(MAX_PROBLEM_DESCRIPTION_LEN + 1)).check_fields(),
            Err(ProblemError::DescriptionTooLong)
        );
        assert!(Problem::new("Fiendish inequality")
            .with_source("IMO 2023/6")
            .with_hardness(40)
            .check_fields()
            .is_ok());
    }
}

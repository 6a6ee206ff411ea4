//! Error types for the tag hierarchy engine

use thiserror::Error;

/// Error type for tag store and tree operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// A tag with this id already exists
    #[error("a tag with id `{0}` already exists")]
    DuplicateId(String),

    /// A bulk batch contained names that collide with existing tags or
    /// with each other. Carries the complete list of offenders.
    #[error("duplicate tag names: {}", .names.join(", "))]
    DuplicateName { names: Vec<String> },

    /// The proposed parent is a descendant of the tag being moved
    #[error("moving `{tag}` under `{new_parent}` would create a cycle")]
    CycleDetected { tag: String, new_parent: String },

    /// A tag was proposed as its own parent
    #[error("tag `{0}` cannot be its own parent")]
    SelfParent(String),

    /// The resulting state would have `use_filter = true` with no parent
    #[error("root tag `{0}` cannot be used as a filter; give it a parent or unset the flag")]
    FilterWithoutParent(String),

    /// Delete attempted on a tag that still has children
    #[error("tag `{id}` has {children} child tag(s); move or delete them first")]
    HasChildren { id: String, children: usize },

    /// Referenced tag id does not exist
    #[error("no tag with id `{0}`")]
    NotFound(String),

    /// Bulk insert input tokenized to nothing
    #[error("no tag names found in input")]
    EmptyBatch,

    /// One or more ids are not valid slugs. Carries the complete list
    /// of offenders.
    #[error("invalid tag id(s): {}; ids must be lowercase words joined by `-` or `_`", .names.join(", "))]
    InvalidId { names: Vec<String> },

    /// Description exceeds the length bound
    #[error("description exceeds {limit} characters")]
    DescriptionTooLong { limit: usize },

    /// A bounded parent-chain walk ran past the total tag count. The
    /// stored tree is corrupted; fatal to the operation, never retried.
    #[error("tag tree corrupted: {0}")]
    InternalConsistency(String),

    /// Storage backend failure
    #[error("storage error: {0}")]
    Store(String),
}

/// Result type for tag operations
pub type TagResult<T> = Result<T, TagError>;

impl TagError {
    /// Create a backend error
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Self::Store(msg.into())
    }

    /// Create an internal-consistency error
    pub fn consistency<S: Into<String>>(msg: S) -> Self {
        Self::InternalConsistency(msg.into())
    }

    /// True for errors the caller can fix by changing the request
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::InternalConsistency(_) | Self::Store(_))
    }

    /// True when the error indicates a corrupted store
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::InternalConsistency(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_are_distinguished_from_fatal_ones() {
        assert!(TagError::SelfParent("algebra".into()).is_user_error());
        assert!(TagError::EmptyBatch.is_user_error());
        assert!(!TagError::consistency("walk exceeded tag count").is_user_error());
        assert!(!TagError::store("disk full").is_user_error());
    }

    #[test]
    fn corruption_flag_only_covers_consistency_failures() {
        assert!(TagError::consistency("cycle in store").is_corruption());
        assert!(!TagError::store("io").is_corruption());
        assert!(!TagError::NotFound("nt".into()).is_corruption());
    }

    #[test]
    fn duplicate_name_lists_every_offender() {
        let err = TagError::DuplicateName {
            names: vec!["angle-chase".into(), "inversion".into()],
        };
        assert_eq!(err.to_string(), "duplicate tag names: angle-chase, inversion");
    }
}

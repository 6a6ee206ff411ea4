//! Tag records and slug handling
//!
//! A [`Tag`] is one node in the classification hierarchy. Its `parent`
//! field is a lookup key into the store, never an owning link; children
//! are derived by reverse lookup and ordered lexicographically by id.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{TagError, TagResult};

/// Maximum description length, matching the persisted column bound
pub const MAX_DESCRIPTION_LEN: usize = 200;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:[-_][a-z0-9]+)*$").expect("valid slug regex"));

/// A node in the tag hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique slug identifier, e.g. `angle-chase`. Immutable once created.
    pub id: String,

    /// Optional longer description, at most [`MAX_DESCRIPTION_LEN`] chars
    #[serde(default)]
    pub description: String,

    /// Whether end users may filter problems by this tag. Umbrella tags
    /// keep this false and exist only to group descendants.
    pub use_filter: bool,

    /// Parent tag id, or `None` for a root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    /// Create a new tag with the given slug id
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            description: String::new(),
            use_filter: true,
            parent: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the filter flag
    pub fn with_use_filter(mut self, use_filter: bool) -> Self {
        self.use_filter = use_filter;
        self
    }

    /// Set the parent tag id
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// True when this tag has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Human display form: `angle-chase` renders as `Angle Chase`
    pub fn display_name(&self) -> String {
        display_name(&self.id)
    }

    /// Check the record's own field bounds (slug shape, description
    /// length). Tree invariants are the validator's job.
    pub fn check_fields(&self) -> TagResult<()> {
        validate_slug(&self.id)?;
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(TagError::DescriptionTooLong {
                limit: MAX_DESCRIPTION_LEN,
            });
        }
        Ok(())
    }
}

/// A partial update applied through [`TagStore::update`](crate::store::TagStore::update)
///
/// `parent` uses a nested option: `None` leaves the edge alone,
/// `Some(None)` detaches the tag to a root, `Some(Some(id))` reparents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPatch {
    pub description: Option<String>,
    pub use_filter: Option<bool>,
    pub parent: Option<Option<String>>,
}

impl TagPatch {
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn use_filter(value: bool) -> Self {
        Self {
            use_filter: Some(value),
            ..Self::default()
        }
    }

    pub fn parent(parent: Option<String>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    /// Apply this patch to a tag, stamping `updated_at`
    pub fn apply(&self, tag: &mut Tag) {
        if let Some(description) = &self.description {
            tag.description = description.clone();
        }
        if let Some(use_filter) = self.use_filter {
            tag.use_filter = use_filter;
        }
        if let Some(parent) = &self.parent {
            tag.parent = parent.clone();
        }
        tag.updated_at = Utc::now();
    }
}

/// Validate a slug id: lowercase ASCII alphanumeric words joined by
/// single `-` or `_` separators
pub fn validate_slug(id: &str) -> TagResult<()> {
    if SLUG_RE.is_match(id) {
        Ok(())
    } else {
        Err(TagError::InvalidId {
            names: vec![id.to_string()],
        })
    }
}

/// Render a slug in its human display form
pub fn display_name(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize a display name back into slug form for lookup.
/// `Angle Chase` becomes `angle-chase`; an already-valid slug passes
/// through unchanged.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

//! TagStore trait
//!
//! Core defines the storage abstraction; backends implement it. Store
//! operations are individually atomic (no partial write is observable)
//! but do not enforce tree invariants — that is the
//! [`TreeIntegrityValidator`](crate::validate::TreeIntegrityValidator)'s
//! job, sequenced by [`TagService`](crate::service::TagService) before
//! every commit. The one exception is child protection on delete, which
//! backends enforce as well so a raw store can never orphan a subtree.

use async_trait::async_trait;

use crate::error::TagResult;
use crate::tag::{Tag, TagPatch};

/// Storage for the tag hierarchy
///
/// Implementations must keep `id` unique and report collisions as
/// [`TagError::DuplicateId`](crate::TagError::DuplicateId). `list_children`
/// orders by id so every traversal of the tree is deterministic.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Insert a new tag, failing on id collision
    async fn create(&self, tag: Tag) -> TagResult<String>;

    /// Insert a batch of tags atomically: either every tag is created or
    /// none are. Any id collision fails the whole batch.
    async fn create_many(&self, tags: Vec<Tag>) -> TagResult<Vec<String>>;

    /// Fetch a tag by id
    async fn get(&self, id: &str) -> TagResult<Tag>;

    /// Fetch a tag by id, `None` when absent
    async fn try_get(&self, id: &str) -> TagResult<Option<Tag>>;

    /// Apply a patch to an existing tag and return the updated record
    async fn update(&self, id: &str, patch: TagPatch) -> TagResult<Tag>;

    /// Remove a tag. Fails with `HasChildren` while any tag still points
    /// at it, and `NotFound` when it does not exist.
    async fn delete(&self, id: &str) -> TagResult<()>;

    /// Look a tag up by its display name ("Angle Chase") or slug
    async fn find_by_name(&self, name: &str) -> TagResult<Tag>;

    /// Children of a tag, ordered lexicographically by id
    async fn list_children(&self, id: &str) -> TagResult<Vec<Tag>>;

    /// Root tags (no parent), ordered by id
    async fn list_roots(&self) -> TagResult<Vec<Tag>>;

    /// Every tag, ordered by id
    async fn list_all(&self) -> TagResult<Vec<Tag>>;

    /// Total tag count; the hop budget for bounded parent-chain walks
    async fn count(&self) -> TagResult<usize>;
}

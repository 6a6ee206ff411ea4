//! TagService façade
//!
//! The only entry point external callers use. Every mutation runs
//! Validator→Store under one coarse mutation mutex, so state-changing
//! operations serialize against each other while reads go straight to
//! the store without the lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::ancestry::AncestryResolver;
use crate::bulk::BulkChildInserter;
use crate::error::{TagError, TagResult};
use crate::store::TagStore;
use crate::tag::{Tag, TagPatch, MAX_DESCRIPTION_LEN};
use crate::validate::TreeIntegrityValidator;

/// Outcome of a bulk `use_filter` toggle. Members that pass validation
/// are applied; every member that fails is reported with its error.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterToggleReport {
    pub updated: Vec<String>,
    pub failed: Vec<(String, TagError)>,
}

impl FilterToggleReport {
    /// True when every requested member was updated
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Façade sequencing validation and storage for the tag hierarchy
pub struct TagService<S: TagStore> {
    store: Arc<S>,
    mutation: Mutex<()>,
}

impl<S: TagStore> TagService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            mutation: Mutex::new(()),
        }
    }

    /// The underlying store, for read-side composition
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // ------------------------------------------------------------------
    // Mutations (serialized by the mutation mutex)
    // ------------------------------------------------------------------

    /// Create a single tag
    pub async fn create_tag(&self, tag: Tag) -> TagResult<Tag> {
        let _guard = self.mutation.lock().await;
        TreeIntegrityValidator::new(self.store.as_ref())
            .validate_create(&tag)
            .await?;
        let id = self.store.create(tag).await?;
        info!(id = %id, "tag created");
        self.store.get(&id).await
    }

    /// Move a tag under a new parent, or detach it to a root
    pub async fn reparent(&self, id: &str, new_parent: Option<String>) -> TagResult<Tag> {
        let _guard = self.mutation.lock().await;
        TreeIntegrityValidator::new(self.store.as_ref())
            .validate_reparent(id, new_parent.as_deref())
            .await?;
        let tag = self
            .store
            .update(id, TagPatch::parent(new_parent.clone()))
            .await?;
        info!(id, parent = ?new_parent, "tag reparented");
        Ok(tag)
    }

    /// Replace a tag's description
    pub async fn set_description(&self, id: &str, description: &str) -> TagResult<Tag> {
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(TagError::DescriptionTooLong {
                limit: MAX_DESCRIPTION_LEN,
            });
        }
        let _guard = self.mutation.lock().await;
        self.store.update(id, TagPatch::description(description)).await
    }

    /// Flip a tag's `use_filter` flag
    pub async fn set_use_filter(&self, id: &str, value: bool) -> TagResult<Tag> {
        let _guard = self.mutation.lock().await;
        TreeIntegrityValidator::new(self.store.as_ref())
            .validate_filter_toggle(id, value)
            .await?;
        self.store.update(id, TagPatch::use_filter(value)).await
    }

    /// Flip `use_filter` across a set of tags, validating each member.
    /// Members that fail are skipped and named in the report.
    pub async fn set_use_filter_bulk(
        &self,
        ids: &[String],
        value: bool,
    ) -> TagResult<FilterToggleReport> {
        let _guard = self.mutation.lock().await;
        let validator = TreeIntegrityValidator::new(self.store.as_ref());
        let mut report = FilterToggleReport::default();
        for id in ids {
            match validator.validate_filter_toggle(id, value).await {
                Ok(()) => {
                    self.store.update(id, TagPatch::use_filter(value)).await?;
                    report.updated.push(id.clone());
                }
                // A corrupted store aborts the whole batch; user errors
                // are collected per member.
                Err(err) if err.is_user_error() => {
                    warn!(id, %err, "bulk filter toggle skipped member");
                    report.failed.push((id.clone(), err));
                }
                Err(err) => return Err(err),
            }
        }
        info!(
            updated = report.updated.len(),
            failed = report.failed.len(),
            "bulk filter toggle finished"
        );
        Ok(report)
    }

    /// Delete a tag with no children
    pub async fn delete_tag(&self, id: &str) -> TagResult<()> {
        let _guard = self.mutation.lock().await;
        TreeIntegrityValidator::new(self.store.as_ref())
            .validate_delete(id)
            .await?;
        self.store.delete(id).await?;
        info!(id, "tag deleted");
        Ok(())
    }

    /// Create children under `parent_id` from free-form text, atomically
    pub async fn add_children(
        &self,
        parent_id: &str,
        raw: &str,
        use_filter: bool,
    ) -> TagResult<Vec<String>> {
        let _guard = self.mutation.lock().await;
        let ids = BulkChildInserter::new(self.store.as_ref())
            .insert_children(parent_id, raw, use_filter)
            .await?;
        info!(parent = parent_id, count = ids.len(), "children inserted");
        Ok(ids)
    }

    // ------------------------------------------------------------------
    // Reads (no mutation lock)
    // ------------------------------------------------------------------

    pub async fn get_tag(&self, id: &str) -> TagResult<Tag> {
        self.store.get(id).await
    }

    pub async fn find_by_name(&self, name: &str) -> TagResult<Tag> {
        self.store.find_by_name(name).await
    }

    pub async fn children(&self, id: &str) -> TagResult<Vec<Tag>> {
        self.store.list_children(id).await
    }

    pub async fn roots(&self) -> TagResult<Vec<Tag>> {
        self.store.list_roots().await
    }

    pub async fn all_tags(&self) -> TagResult<Vec<Tag>> {
        self.store.list_all().await
    }

    pub async fn is_ancestor(&self, candidate: &str, of: &str) -> TagResult<bool> {
        AncestryResolver::new(self.store.as_ref())
            .is_ancestor(candidate, of)
            .await
    }

    pub async fn is_descendant(&self, candidate: &str, of: &str) -> TagResult<bool> {
        AncestryResolver::new(self.store.as_ref())
            .is_descendant(candidate, of)
            .await
    }

    /// Ancestors of a tag, nearest first
    pub async fn ancestors(&self, id: &str) -> TagResult<Vec<Tag>> {
        AncestryResolver::new(self.store.as_ref()).ancestors(id).await
    }

    /// Preorder snapshot of the whole tree as `(depth, tag)` pairs,
    /// siblings in id order. Assembled from a single `list_all` read so
    /// a mutation landing mid-walk cannot duplicate or drop a tag.
    pub async fn tree(&self) -> TagResult<Vec<(usize, Tag)>> {
        // list_all returns id order, which grouping preserves per parent.
        let mut by_parent: BTreeMap<Option<String>, Vec<Tag>> = BTreeMap::new();
        for tag in self.store.list_all().await? {
            by_parent.entry(tag.parent.clone()).or_default().push(tag);
        }

        let mut out = Vec::new();
        let mut stack: Vec<(usize, Tag)> = by_parent
            .remove(&None)
            .unwrap_or_default()
            .into_iter()
            .rev()
            .map(|tag| (0, tag))
            .collect();
        while let Some((depth, tag)) = stack.pop() {
            if let Some(children) = by_parent.remove(&Some(tag.id.clone())) {
                stack.extend(children.into_iter().rev().map(|child| (depth + 1, child)));
            }
            out.push((depth, tag));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTagStore;

    fn service() -> TagService<MemoryTagStore> {
        TagService::new(Arc::new(MemoryTagStore::new()))
    }

    async fn seeded() -> TagService<MemoryTagStore> {
        let svc = service();
        svc.create_tag(Tag::new("geo").with_use_filter(false)).await.unwrap();
        svc.create_tag(Tag::new("nt").with_use_filter(false)).await.unwrap();
        svc.add_children("geo", "angle-chase inversion", true).await.unwrap();
        svc
    }

    #[tokio::test]
    async fn create_runs_the_validator_before_the_store() {
        let svc = service();
        assert_eq!(
            svc.create_tag(Tag::new("geo")).await.unwrap_err(),
            TagError::FilterWithoutParent("geo".into())
        );
        assert_eq!(svc.all_tags().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn reparent_moves_subtrees_and_refuses_cycles() {
        let svc = seeded().await;
        svc.reparent("nt", Some("geo".into())).await.unwrap();
        assert!(svc.is_descendant("nt", "geo").await.unwrap());

        assert_eq!(
            svc.reparent("geo", Some("angle-chase".into())).await.unwrap_err(),
            TagError::CycleDetected {
                tag: "geo".into(),
                new_parent: "angle-chase".into()
            }
        );
        assert_eq!(
            svc.reparent("geo", Some("geo".into())).await.unwrap_err(),
            TagError::SelfParent("geo".into())
        );
    }

    #[tokio::test]
    async fn bulk_toggle_applies_valid_members_and_names_failures() {
        let svc = seeded().await;
        let ids: Vec<String> = ["geo", "angle-chase", "missing"]
            .into_iter()
            .map(String::from)
            .collect();

        let report = svc.set_use_filter_bulk(&ids, true).await.unwrap();
        assert_eq!(report.updated, ["angle-chase"]);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(
            report.failed[0],
            ("geo".into(), TagError::FilterWithoutParent("geo".into()))
        );
        assert_eq!(
            report.failed[1],
            ("missing".into(), TagError::NotFound("missing".into()))
        );
        assert!(!report.is_clean());

        // Disabling is always legal for existing tags.
        let ids: Vec<String> = ["geo", "angle-chase"].into_iter().map(String::from).collect();
        let report = svc.set_use_filter_bulk(&ids, false).await.unwrap();
        assert!(report.is_clean());
        assert!(!svc.get_tag("angle-chase").await.unwrap().use_filter);
    }

    #[tokio::test]
    async fn delete_respects_child_protection_end_to_end() {
        let svc = seeded().await;
        assert!(matches!(
            svc.delete_tag("geo").await.unwrap_err(),
            TagError::HasChildren { .. }
        ));
        svc.delete_tag("angle-chase").await.unwrap();
        svc.delete_tag("inversion").await.unwrap();
        svc.delete_tag("geo").await.unwrap();
    }

    #[tokio::test]
    async fn tree_is_preorder_with_sorted_siblings() {
        let svc = seeded().await;
        let rows: Vec<(usize, String)> = svc
            .tree()
            .await
            .unwrap()
            .into_iter()
            .map(|(depth, tag)| (depth, tag.id))
            .collect();
        assert_eq!(
            rows,
            [
                (0, "geo".to_string()),
                (1, "angle-chase".to_string()),
                (1, "inversion".to_string()),
                (0, "nt".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn tree_reflects_nested_reparenting_in_one_pass() {
        let svc = seeded().await;
        svc.reparent("nt", Some("inversion".into())).await.unwrap();
        svc.add_children("nt", "mod-arith", true).await.unwrap();

        let rows: Vec<(usize, String)> = svc
            .tree()
            .await
            .unwrap()
            .into_iter()
            .map(|(depth, tag)| (depth, tag.id))
            .collect();
        assert_eq!(
            rows,
            [
                (0, "geo".to_string()),
                (1, "angle-chase".to_string()),
                (1, "inversion".to_string()),
                (2, "nt".to_string()),
                (3, "mod-arith".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn long_descriptions_are_rejected_not_truncated() {
        let svc = seeded().await;
        let err = svc
            .set_description("geo", &"x".repeat(MAX_DESCRIPTION_LEN + 1))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TagError::DescriptionTooLong {
                limit: MAX_DESCRIPTION_LEN
            }
        );
        svc.set_description("geo", "Euclidean geometry").await.unwrap();
        assert_eq!(svc.get_tag("geo").await.unwrap().description, "Euclidean geometry");
    }
}

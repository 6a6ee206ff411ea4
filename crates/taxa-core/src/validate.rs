//! Tree integrity validation
//!
//! Every mutation is approved here before the service commits it. The
//! four invariants:
//!
//! 1. Acyclicity — no tag is its own ancestor
//! 2. Id uniqueness
//! 3. Filter-implies-parent — `use_filter` requires a parent
//! 4. Deletion protection — a tag with children cannot be deleted
//!
//! Violations come back as typed [`TagError`]s and are never coerced
//! away (a root is not silently un-filtered, a delete never orphans).

use tracing::debug;

use crate::ancestry::AncestryResolver;
use crate::error::{TagError, TagResult};
use crate::store::TagStore;
use crate::tag::Tag;

/// Decides whether a proposed mutation is legal against the current tree
pub struct TreeIntegrityValidator<'a, S: TagStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TagStore + ?Sized> TreeIntegrityValidator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Approve a single-tag creation
    pub async fn validate_create(&self, candidate: &Tag) -> TagResult<()> {
        candidate.check_fields()?;
        if self.store.try_get(&candidate.id).await?.is_some() {
            return Err(TagError::DuplicateId(candidate.id.clone()));
        }
        if let Some(parent) = &candidate.parent {
            // Parent must exist; a dangling edge would corrupt the tree.
            self.store.get(parent).await?;
        } else if candidate.use_filter {
            return Err(TagError::FilterWithoutParent(candidate.id.clone()));
        }
        debug!(id = %candidate.id, "create approved");
        Ok(())
    }

    /// Approve moving `tag_id` under `new_parent` (`None` detaches to root)
    pub async fn validate_reparent(
        &self,
        tag_id: &str,
        new_parent: Option<&str>,
    ) -> TagResult<()> {
        let tag = self.store.get(tag_id).await?;
        match new_parent {
            Some(parent_id) if parent_id == tag_id => {
                Err(TagError::SelfParent(tag_id.to_string()))
            }
            Some(parent_id) => {
                // Cycle check: the tag must not already sit above the
                // proposed parent.
                let resolver = AncestryResolver::new(self.store);
                if resolver.is_ancestor(tag_id, parent_id).await? {
                    return Err(TagError::CycleDetected {
                        tag: tag_id.to_string(),
                        new_parent: parent_id.to_string(),
                    });
                }
                debug!(id = tag_id, parent = parent_id, "reparent approved");
                Ok(())
            }
            None if tag.use_filter => Err(TagError::FilterWithoutParent(tag_id.to_string())),
            None => Ok(()),
        }
    }

    /// Approve flipping `use_filter` on an existing tag
    pub async fn validate_filter_toggle(&self, tag_id: &str, new_value: bool) -> TagResult<()> {
        let tag = self.store.get(tag_id).await?;
        if new_value && tag.is_root() {
            return Err(TagError::FilterWithoutParent(tag_id.to_string()));
        }
        Ok(())
    }

    /// Approve deleting a tag
    pub async fn validate_delete(&self, tag_id: &str) -> TagResult<()> {
        self.store.get(tag_id).await?;
        let children = self.store.list_children(tag_id).await?;
        if !children.is_empty() {
            return Err(TagError::HasChildren {
                id: tag_id.to_string(),
                children: children.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTagStore;

    async fn chain_store() -> MemoryTagStore {
        // a -> b -> c
        let store = MemoryTagStore::new();
        store.create(Tag::new("a").with_use_filter(false)).await.unwrap();
        store.create(Tag::new("b").with_parent("a")).await.unwrap();
        store.create(Tag::new("c").with_parent("b")).await.unwrap();
        store
    }

    #[tokio::test]
    async fn create_rejects_filterable_roots() {
        let store = MemoryTagStore::new();
        let validator = TreeIntegrityValidator::new(&store);

        let root = Tag::new("geo");
        assert_eq!(
            validator.validate_create(&root).await.unwrap_err(),
            TagError::FilterWithoutParent("geo".into())
        );
        let umbrella = Tag::new("geo").with_use_filter(false);
        assert!(validator.validate_create(&umbrella).await.is_ok());
    }

    #[tokio::test]
    async fn create_rejects_duplicates_and_dangling_parents() {
        let store = chain_store().await;
        let validator = TreeIntegrityValidator::new(&store);

        assert_eq!(
            validator
                .validate_create(&Tag::new("b").with_parent("a"))
                .await
                .unwrap_err(),
            TagError::DuplicateId("b".into())
        );
        assert_eq!(
            validator
                .validate_create(&Tag::new("d").with_parent("ghost"))
                .await
                .unwrap_err(),
            TagError::NotFound("ghost".into())
        );
    }

    #[tokio::test]
    async fn create_rejects_malformed_slugs() {
        let store = MemoryTagStore::new();
        let validator = TreeIntegrityValidator::new(&store);
        assert_eq!(
            validator
                .validate_create(&Tag::new("Not A Slug").with_use_filter(false))
                .await
                .unwrap_err(),
            TagError::InvalidId {
                names: vec!["Not A Slug".into()]
            }
        );
    }

    #[tokio::test]
    async fn reparent_detects_the_degenerate_self_cycle() {
        let store = chain_store().await;
        let validator = TreeIntegrityValidator::new(&store);
        assert_eq!(
            validator.validate_reparent("b", Some("b")).await.unwrap_err(),
            TagError::SelfParent("b".into())
        );
    }

    #[tokio::test]
    async fn reparent_detects_longer_cycles() {
        let store = chain_store().await;
        let validator = TreeIntegrityValidator::new(&store);
        assert_eq!(
            validator.validate_reparent("a", Some("c")).await.unwrap_err(),
            TagError::CycleDetected {
                tag: "a".into(),
                new_parent: "c".into()
            }
        );
        // Moving down-chain the other way is fine.
        assert!(validator.validate_reparent("c", Some("a")).await.is_ok());
    }

    #[tokio::test]
    async fn detaching_a_filter_tag_to_root_is_refused() {
        let store = chain_store().await;
        let validator = TreeIntegrityValidator::new(&store);
        assert_eq!(
            validator.validate_reparent("b", None).await.unwrap_err(),
            TagError::FilterWithoutParent("b".into())
        );
    }

    #[tokio::test]
    async fn filter_toggle_respects_the_root_invariant() {
        let store = chain_store().await;
        let validator = TreeIntegrityValidator::new(&store);
        assert_eq!(
            validator.validate_filter_toggle("a", true).await.unwrap_err(),
            TagError::FilterWithoutParent("a".into())
        );
        assert!(validator.validate_filter_toggle("a", false).await.is_ok());
        assert!(validator.validate_filter_toggle("b", true).await.is_ok());
    }

    #[tokio::test]
    async fn delete_protection_counts_children() {
        let store = chain_store().await;
        let validator = TreeIntegrityValidator::new(&store);
        assert_eq!(
            validator.validate_delete("a").await.unwrap_err(),
            TagError::HasChildren {
                id: "a".into(),
                children: 1
            }
        );
        assert!(validator.validate_delete("c").await.is_ok());
    }
}

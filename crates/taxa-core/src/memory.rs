//! In-memory TagStore
//!
//! Deterministic, lock-based implementation with no I/O. Used by the
//! engine's own tests and by embedders that do not need persistence.
//! A `BTreeMap` keyed by id gives lexicographic ordering for free.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{TagError, TagResult};
use crate::store::TagStore;
use crate::tag::{normalize_name, Tag, TagPatch};

/// In-memory tag store backed by a `BTreeMap` behind an `RwLock`
#[derive(Debug, Default)]
pub struct MemoryTagStore {
    tags: RwLock<BTreeMap<String, Tag>>,
}

impl MemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn child_count(tags: &BTreeMap<String, Tag>, id: &str) -> usize {
        tags.values()
            .filter(|tag| tag.parent.as_deref() == Some(id))
            .count()
    }
}

#[async_trait]
impl TagStore for MemoryTagStore {
    async fn create(&self, tag: Tag) -> TagResult<String> {
        let mut tags = self.tags.write();
        if tags.contains_key(&tag.id) {
            return Err(TagError::DuplicateId(tag.id));
        }
        let id = tag.id.clone();
        tags.insert(id.clone(), tag);
        Ok(id)
    }

    async fn create_many(&self, batch: Vec<Tag>) -> TagResult<Vec<String>> {
        // Single write lock: the batch is checked in full before the
        // first insert, so a failure leaves the map untouched.
        let mut tags = self.tags.write();
        let mut ids = Vec::with_capacity(batch.len());
        for tag in &batch {
            if tags.contains_key(&tag.id) || ids.contains(&tag.id) {
                return Err(TagError::DuplicateId(tag.id.clone()));
            }
            ids.push(tag.id.clone());
        }
        for tag in batch {
            tags.insert(tag.id.clone(), tag);
        }
        Ok(ids)
    }

    async fn get(&self, id: &str) -> TagResult<Tag> {
        self.tags
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| TagError::NotFound(id.to_string()))
    }

    async fn try_get(&self, id: &str) -> TagResult<Option<Tag>> {
        Ok(self.tags.read().get(id).cloned())
    }

    async fn update(&self, id: &str, patch: TagPatch) -> TagResult<Tag> {
        let mut tags = self.tags.write();
        let tag = tags
            .get_mut(id)
            .ok_or_else(|| TagError::NotFound(id.to_string()))?;
        patch.apply(tag);
        Ok(tag.clone())
    }

    async fn delete(&self, id: &str) -> TagResult<()> {
        let mut tags = self.tags.write();
        if !tags.contains_key(id) {
            return Err(TagError::NotFound(id.to_string()));
        }
        let children = Self::child_count(&tags, id);
        if children > 0 {
            return Err(TagError::HasChildren {
                id: id.to_string(),
                children,
            });
        }
        tags.remove(id);
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> TagResult<Tag> {
        let slug = normalize_name(name);
        self.tags
            .read()
            .get(&slug)
            .cloned()
            .ok_or_else(|| TagError::NotFound(slug))
    }

    async fn list_children(&self, id: &str) -> TagResult<Vec<Tag>> {
        Ok(self
            .tags
            .read()
            .values()
            .filter(|tag| tag.parent.as_deref() == Some(id))
            .cloned()
            .collect())
    }

    async fn list_roots(&self) -> TagResult<Vec<Tag>> {
        Ok(self
            .tags
            .read()
            .values()
            .filter(|tag| tag.is_root())
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> TagResult<Vec<Tag>> {
        Ok(self.tags.read().values().cloned().collect())
    }

    async fn count(&self) -> TagResult<usize> {
        Ok(self.tags.read().len())
    }
}

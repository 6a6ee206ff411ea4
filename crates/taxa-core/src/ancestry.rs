//! Ancestor/descendant reachability over parent links
//!
//! The tree is guaranteed acyclic by the validator, but every walk here
//! still carries a hop budget equal to the total tag count. A store that
//! has been corrupted out-of-band (a cycle written behind the engine's
//! back) then trips [`TagError::InternalConsistency`] instead of looping.

use tracing::error;

use crate::error::{TagError, TagResult};
use crate::store::TagStore;
use crate::tag::Tag;

/// Answers reachability questions by walking parent chains iteratively
pub struct AncestryResolver<'a, S: TagStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TagStore + ?Sized> AncestryResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// True iff `candidate` equals `of` or lies on `of`'s parent chain.
    /// Reflexive: every tag is its own ancestor.
    pub async fn is_ancestor(&self, candidate: &str, of: &str) -> TagResult<bool> {
        if candidate == of {
            // Both must still exist for the reflexive answer to be honest.
            self.store.get(candidate).await?;
            return Ok(true);
        }
        let mut current = self.store.get(of).await?.parent;
        let mut budget = self.store.count().await?;
        while let Some(id) = current {
            if id == candidate {
                return Ok(true);
            }
            if budget == 0 {
                error!(tag = of, "parent chain exceeds total tag count");
                return Err(TagError::consistency(format!(
                    "parent chain of `{of}` exceeds total tag count"
                )));
            }
            budget -= 1;
            current = self.store.get(&id).await?.parent;
        }
        Ok(false)
    }

    /// True iff `candidate` sits in the subtree rooted at `of`
    pub async fn is_descendant(&self, candidate: &str, of: &str) -> TagResult<bool> {
        self.is_ancestor(of, candidate).await
    }

    /// The chain from a tag's parent up to its root, nearest first
    pub async fn ancestors(&self, id: &str) -> TagResult<Vec<Tag>> {
        let mut chain = Vec::new();
        let mut current = self.store.get(id).await?.parent;
        let mut budget = self.store.count().await?;
        while let Some(parent_id) = current {
            if budget == 0 {
                error!(tag = id, "parent chain exceeds total tag count");
                return Err(TagError::consistency(format!(
                    "parent chain of `{id}` exceeds total tag count"
                )));
            }
            budget -= 1;
            let parent = self.store.get(&parent_id).await?;
            current = parent.parent.clone();
            chain.push(parent);
        }
        Ok(chain)
    }

    /// Number of edges between a tag and its root
    pub async fn depth(&self, id: &str) -> TagResult<usize> {
        Ok(self.ancestors(id).await?.len())
    }
}

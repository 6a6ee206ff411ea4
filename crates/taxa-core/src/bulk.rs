//! Bulk child insertion
//!
//! Free-form text ("angle-chase, inversion\nspiral-sim") becomes a batch
//! of sibling tags under one parent. The whole batch is validated before
//! anything is written, every offending name is collected into a single
//! report, and the commit goes through [`TagStore::create_many`] so the
//! backend makes it all-or-nothing.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{TagError, TagResult};
use crate::store::TagStore;
use crate::tag::{validate_slug, Tag};
use crate::validate::TreeIntegrityValidator;

/// Split raw input on any run of spaces, commas, and newlines
pub fn tokenize(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Creates a batch of children under a single parent, atomically
pub struct BulkChildInserter<'a, S: TagStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TagStore + ?Sized> BulkChildInserter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Create one child per token in `raw`, each with a blank description
    /// and the given `use_filter`, under `parent_id`. Returns the created
    /// ids in input order. Either every child is created or none are.
    pub async fn insert_children(
        &self,
        parent_id: &str,
        raw: &str,
        use_filter: bool,
    ) -> TagResult<Vec<String>> {
        // Parent must exist before anything else is diagnosed.
        self.store.get(parent_id).await?;

        let names = tokenize(raw);
        if names.is_empty() {
            return Err(TagError::EmptyBatch);
        }

        // Every malformed token is named in one error, not just the first.
        let invalid: BTreeSet<String> = names
            .iter()
            .filter(|name| validate_slug(name).is_err())
            .cloned()
            .collect();
        if !invalid.is_empty() {
            return Err(TagError::InvalidId {
                names: invalid.into_iter().collect(),
            });
        }

        // Collect every offender, in-batch repeats and store collisions
        // alike, into one report.
        let mut offenders = BTreeSet::new();
        let mut seen = BTreeSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) || self.store.try_get(name).await?.is_some() {
                offenders.insert(name.clone());
            }
        }
        if !offenders.is_empty() {
            return Err(TagError::DuplicateName {
                names: offenders.into_iter().collect(),
            });
        }

        let validator = TreeIntegrityValidator::new(self.store);
        let mut batch = Vec::with_capacity(names.len());
        for name in &names {
            let child = Tag::new(name)
                .with_parent(parent_id)
                .with_use_filter(use_filter);
            // The validator stays the single source of truth even though
            // filter-implies-parent cannot fail here.
            validator.validate_create(&child).await?;
            batch.push(child);
        }

        debug!(parent = parent_id, count = batch.len(), "inserting child batch");
        match self.store.create_many(batch).await {
            // A concurrent create can still collide inside the backend's
            // transaction; report it as a batch failure like any other.
            Err(TagError::DuplicateId(id)) => Err(TagError::DuplicateName { names: vec![id] }),
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTagStore;

    async fn store_with_parent() -> MemoryTagStore {
        let store = MemoryTagStore::new();
        store.create(Tag::new("geo").with_use_filter(false)).await.unwrap();
        store
    }

    #[test]
    fn tokenize_splits_on_mixed_delimiters() {
        assert_eq!(tokenize("foo, bar\nbaz qux"), ["foo", "bar", "baz", "qux"]);
        assert_eq!(tokenize(",,  \n"), Vec::<String>::new());
        assert_eq!(tokenize("solo"), ["solo"]);
    }

    #[tokio::test]
    async fn inserts_three_children_with_blank_descriptions() {
        let store = store_with_parent().await;
        let inserter = BulkChildInserter::new(&store);
        let ids = inserter.insert_children("geo", "a b\nc", true).await.unwrap();
        assert_eq!(ids, ["a", "b", "c"]);

        for id in ids {
            let tag = store.get(&id).await.unwrap();
            assert_eq!(tag.parent.as_deref(), Some("geo"));
            assert!(tag.description.is_empty());
            assert!(tag.use_filter);
        }
    }

    #[tokio::test]
    async fn repeated_name_fails_the_whole_batch() {
        let store = store_with_parent().await;
        let inserter = BulkChildInserter::new(&store);
        let err = inserter
            .insert_children("geo", "angle-chase, angle-chase", true)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TagError::DuplicateName {
                names: vec!["angle-chase".into()]
            }
        );
        assert_eq!(store.count().await.unwrap(), 1, "no child may be created");
    }

    #[tokio::test]
    async fn all_offenders_are_reported_together() {
        let store = store_with_parent().await;
        store.create(Tag::new("inversion").with_parent("geo")).await.unwrap();
        let inserter = BulkChildInserter::new(&store);

        let err = inserter
            .insert_children("geo", "inversion fresh doubled doubled", true)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TagError::DuplicateName {
                names: vec!["doubled".into(), "inversion".into()]
            }
        );
        assert!(store.try_get("fresh").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_input_is_a_distinct_error() {
        let store = store_with_parent().await;
        let inserter = BulkChildInserter::new(&store);
        assert_eq!(
            inserter.insert_children("geo", " ,\n ", true).await.unwrap_err(),
            TagError::EmptyBatch
        );
    }

    #[tokio::test]
    async fn missing_parent_is_reported_before_tokenizing() {
        let store = MemoryTagStore::new();
        let inserter = BulkChildInserter::new(&store);
        assert_eq!(
            inserter.insert_children("ghost", "a b", true).await.unwrap_err(),
            TagError::NotFound("ghost".into())
        );
    }

    #[tokio::test]
    async fn every_malformed_token_is_named_in_one_error() {
        let store = store_with_parent().await;
        let inserter = BulkChildInserter::new(&store);
        assert_eq!(
            inserter
                .insert_children("geo", "BAD fine WORSE", false)
                .await
                .unwrap_err(),
            TagError::InvalidId {
                names: vec!["BAD".into(), "WORSE".into()]
            }
        );
        assert!(store.try_get("fine").await.unwrap().is_none());
    }
}

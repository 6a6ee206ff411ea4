//! End-to-end tests: the tag hierarchy engine over the SQLite backend
//!
//! Exercises the full Validator→Store path through `TagService` against
//! a real database file, including the invariants the in-memory tests
//! cover only in isolation.

use std::sync::Arc;

use taxa_core::{Tag, TagError, TagService};
use taxa_sqlite::{SqliteConfig, SqlitePool, SqliteTagStore};

fn service_on(pool: SqlitePool) -> TagService<SqliteTagStore> {
    TagService::new(Arc::new(SqliteTagStore::new(pool)))
}

async fn seeded_service(pool: SqlitePool) -> TagService<SqliteTagStore> {
    let service = service_on(pool);
    service
        .create_tag(Tag::new("geo").with_use_filter(false))
        .await
        .unwrap();
    service
        .create_tag(Tag::new("nt").with_use_filter(false))
        .await
        .unwrap();
    service
        .add_children("geo", "angle-chase, inversion\nspiral-sim", true)
        .await
        .unwrap();
    service
}

#[tokio::test]
async fn tree_survives_a_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taxa.db");

    {
        let pool = SqlitePool::new(SqliteConfig::new(&path)).unwrap();
        seeded_service(pool).await;
    }

    let pool = SqlitePool::new(SqliteConfig::new(&path)).unwrap();
    let service = service_on(pool);
    let rows: Vec<(usize, String)> = service
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
            (1, "spiral-sim".to_string()),
            (0, "nt".to_string()),
        ]
    );
}

#[tokio::test]
async fn cycles_are_rejected_through_the_full_stack() {
    let service = seeded_service(SqlitePool::memory().unwrap()).await;
    service
        .reparent("nt", Some("angle-chase".into()))
        .await
        .unwrap();

    // geo -> angle-chase -> nt; closing the loop must fail.
    assert_eq!(
        service.reparent("geo", Some("nt".into())).await.unwrap_err(),
        TagError::CycleDetected {
            tag: "geo".into(),
            new_parent: "nt".into()
        }
    );
    assert_eq!(
        service.reparent("nt", Some("nt".into())).await.unwrap_err(),
        TagError::SelfParent("nt".into())
    );

    // The failed attempts changed nothing.
    assert!(service.get_tag("geo").await.unwrap().is_root());
}

#[tokio::test]
async fn bulk_insert_rolls_back_in_the_database() {
    let service = seeded_service(SqlitePool::memory().unwrap()).await;

    let err = service
        .add_children("nt", "mod-arith inversion fresh", true)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TagError::DuplicateName {
            names: vec!["inversion".into()]
        }
    );

    // Nothing from the failed batch landed.
    assert!(service.children("nt").await.unwrap().is_empty());
    assert_eq!(
        service.get_tag("fresh").await.unwrap_err(),
        TagError::NotFound("fresh".into())
    );
}

#[tokio::test]
async fn filter_invariant_holds_across_reparent_and_toggle() {
    let service = seeded_service(SqlitePool::memory().unwrap()).await;

    assert_eq!(
        service
            .create_tag(Tag::new("combinatorics"))
            .await
            .unwrap_err(),
        TagError::FilterWithoutParent("combinatorics".into())
    );
    assert_eq!(
        service.set_use_filter("geo", true).await.unwrap_err(),
        TagError::FilterWithoutParent("geo".into())
    );
    assert_eq!(
        service.reparent("angle-chase", None).await.unwrap_err(),
        TagError::FilterWithoutParent("angle-chase".into())
    );

    // Unset the flag first, then detaching is legal.
    service.set_use_filter("angle-chase", false).await.unwrap();
    let detached = service.reparent("angle-chase", None).await.unwrap();
    assert!(detached.is_root());
}

#[tokio::test]
async fn delete_protection_is_enforced_by_engine_and_schema() {
    let service = seeded_service(SqlitePool::memory().unwrap()).await;

    assert!(matches!(
        service.delete_tag("geo").await.unwrap_err(),
        TagError::HasChildren { id, children: 3 } if id == "geo"
    ));

    for child in ["angle-chase", "inversion", "spiral-sim"] {
        service.delete_tag(child).await.unwrap();
    }
    service.delete_tag("geo").await.unwrap();
    assert_eq!(
        service.get_tag("geo").await.unwrap_err(),
        TagError::NotFound("geo".into())
    );
}

#[tokio::test]
async fn bulk_filter_toggle_reports_every_failed_member() {
    let service = seeded_service(SqlitePool::memory().unwrap()).await;
    let ids: Vec<String> = ["geo", "inversion", "ghost"]
        .into_iter()
        .map(String::from)
        .collect();

    let report = service.set_use_filter_bulk(&ids, true).await.unwrap();
    assert_eq!(report.updated, ["inversion"]);
    assert_eq!(
        report.failed,
        [
            ("geo".into(), TagError::FilterWithoutParent("geo".into())),
            ("ghost".into(), TagError::NotFound("ghost".into())),
        ]
    );
}

//! Topic operation tests
//!
//! Referential checks, moves between categories, redistribution and the
//! document bookkeeping that follows a topic rewrite.

use pretty_assertions::assert_eq;
use quire_model::ValidationError;
use quire_sync::SyncError;
use quire_test_utils::{article, chapter, new_topic, topic, TempCatalog};
use std::collections::BTreeMap;

async fn catalog_with(categories: &[&str], topics: &[(&str, &str)]) -> TempCatalog {
    let catalog = TempCatalog::new().await;
    for slug in categories {
        catalog.sync.add_category(&slug.to_uppercase(), slug).await.unwrap();
    }
    for (category, slug) in topics {
        catalog
            .sync
            .add_topic(category, new_topic(&slug.to_uppercase(), slug))
            .await
            .unwrap();
    }
    catalog
}

fn slugs(category: &quire_model::Category) -> Vec<&str> {
    category.items.iter().map(|t| t.slug.as_str()).collect()
}

/// Tenet: a missing category is refused before any file is touched
#[tokio::test]
async fn add_topic_to_missing_category_writes_nothing() {
    let catalog = catalog_with(&["backend"], &[]).await;
    let index = catalog.category_index().await;
    let data = catalog.data_index().await;

    let err = catalog
        .sync
        .add_topic("nowhere", new_topic("Go", "go"))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::CategoryNotFound(ref id) if id == "nowhere"));
    assert_eq!(catalog.category_index().await, index);
    assert_eq!(catalog.data_index().await, data);
    assert!(!catalog.sync.paths().topic_file("go").exists());
}

/// Tenet: topic slugs are unique across all categories
#[tokio::test]
async fn add_topic_rejects_slug_used_elsewhere() {
    let catalog = catalog_with(&["backend", "systems"], &[("backend", "go")]).await;

    let err = catalog
        .sync
        .add_topic("systems", new_topic("Go again", "go"))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Validation(ValidationError::DuplicateSlug(_))));
}

/// Tenet: deleting an empty topic removes every trace of it
#[tokio::test]
async fn delete_empty_topic_cleans_up() {
    let catalog = catalog_with(&["backend"], &[]).await;
    let index = catalog.category_index().await;
    let data = catalog.data_index().await;

    catalog.sync.add_topic("backend", new_topic("Go", "go")).await.unwrap();
    let deleted = catalog.sync.delete_topic("go").await.unwrap();
    assert_eq!(deleted.value.slug, "go");
    assert!(deleted.report.is_clean());

    assert_eq!(catalog.category_index().await, index);
    assert_eq!(catalog.data_index().await, data);
    assert!(!catalog.sync.paths().topic_dir("go").exists());
    assert!(!catalog.sync.paths().document_dir("go").exists());
}

/// Tenet: a topic that still owns articles is never deleted
#[tokio::test]
async fn delete_refuses_topic_with_articles() {
    let catalog = catalog_with(&["backend"], &[("backend", "go")]).await;
    catalog
        .sync
        .update_topic_detail(topic(
            "backend",
            "Go",
            "go",
            vec![chapter("Basics", vec![article("intro", "Intro")])],
        ))
        .await
        .unwrap();
    let index = catalog.category_index().await;
    let file = catalog.topic_file("go").await;

    let err = catalog.sync.delete_topic("go").await.unwrap_err();
    assert!(matches!(err, SyncError::TopicHasArticles { articles: 1, .. }));
    assert_eq!(catalog.category_index().await, index);
    assert_eq!(catalog.topic_file("go").await, file);
    assert!(catalog.document("go", "intro").exists());

    let err = catalog.sync.delete_topic("missing").await.unwrap_err();
    assert!(matches!(err, SyncError::TopicNotFound(_)));
}

/// Tenet: a changed categoryId moves the reference between categories
#[tokio::test]
async fn update_moves_topic_to_other_category() {
    let catalog = catalog_with(&["backend", "systems"], &[("backend", "go")]).await;

    let moved = catalog
        .sync
        .update_topic_detail(topic("systems", "Go", "go", vec![]))
        .await
        .unwrap();
    assert_eq!(moved.value.category_id, "systems");

    let categories = catalog.sync.categories().await.unwrap();
    assert!(categories[0].items.is_empty());
    assert_eq!(slugs(&categories[1]), vec!["go"]);
    assert_eq!(categories[1].items[0].category_id, "systems");
    assert_eq!(catalog.sync.topic("go").await.unwrap().category_id, "systems");
}

/// Tenet: duplicate article slugs within a topic are refused
#[tokio::test]
async fn update_rejects_duplicate_article_slugs() {
    let catalog = catalog_with(&["backend"], &[("backend", "go")]).await;
    let file = catalog.topic_file("go").await;

    let err = catalog
        .sync
        .update_topic_detail(topic(
            "backend",
            "Go",
            "go",
            vec![
                chapter("One", vec![article("intro", "Intro")]),
                chapter("Two", vec![article("intro", "Intro again")]),
            ],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Validation(ValidationError::DuplicateSlug(_))));
    assert_eq!(catalog.topic_file("go").await, file);
}

/// Tenet: swapping two article slugs swaps their documents
#[tokio::test]
async fn swapped_slugs_swap_documents() {
    let catalog = catalog_with(&["backend"], &[("backend", "go")]).await;
    let written = catalog
        .sync
        .update_topic_detail(topic(
            "backend",
            "Go",
            "go",
            vec![chapter("Basics", vec![article("a", "A"), article("b", "B")])],
        ))
        .await
        .unwrap()
        .value;
    catalog.write(&catalog.document("go", "a"), "first\n").await;
    catalog.write(&catalog.document("go", "b"), "second\n").await;

    let mut swapped = written;
    swapped.chapters[0].articles[0].slug = "b".into();
    swapped.chapters[0].articles[1].slug = "a".into();
    let synced = catalog.sync.update_topic_detail(swapped).await.unwrap();

    assert!(synced.report.is_clean());
    assert_eq!(catalog.read(&catalog.document("go", "b")).await, "first\n");
    assert_eq!(catalog.read(&catalog.document("go", "a")).await, "second\n");
}

/// Tenet: renaming onto a removed article's slug replaces its document
#[tokio::test]
async fn rename_onto_removed_slug_replaces_document() {
    let catalog = catalog_with(&["backend"], &[("backend", "go")]).await;
    let written = catalog
        .sync
        .update_topic_detail(topic(
            "backend",
            "Go",
            "go",
            vec![chapter("Basics", vec![article("a", "A"), article("b", "B")])],
        ))
        .await
        .unwrap()
        .value;
    catalog.write(&catalog.document("go", "a"), "old a\n").await;
    catalog.write(&catalog.document("go", "b"), "old b\n").await;

    let mut replaced = written;
    replaced.chapters[0].articles.remove(0);
    replaced.chapters[0].articles[0].slug = "a".into();
    let synced = catalog.sync.update_topic_detail(replaced).await.unwrap();

    assert!(synced.report.is_clean());
    assert_eq!(catalog.read(&catalog.document("go", "a")).await, "old b\n");
    assert!(!catalog.document("go", "b").exists());
    let steps: Vec<&str> = synced.report.completed.iter().map(|s| s.step.as_str()).collect();
    assert!(steps.contains(&"delete document"));
    assert!(steps.contains(&"rename document"));
}

/// Tenet: a rename onto an unrelated existing document is skipped
#[tokio::test]
async fn rename_onto_existing_document_is_skipped() {
    let catalog = catalog_with(&["backend"], &[("backend", "go")]).await;
    let written = catalog
        .sync
        .update_topic_detail(topic(
            "backend",
            "Go",
            "go",
            vec![chapter("Basics", vec![article("intro", "Intro")])],
        ))
        .await
        .unwrap()
        .value;
    catalog.write(&catalog.document("go", "taken"), "keep me\n").await;

    let mut renamed = written;
    renamed.chapters[0].articles[0].slug = "taken".into();
    let synced = catalog.sync.update_topic_detail(renamed).await.unwrap();

    assert_eq!(synced.report.skipped.len(), 1);
    assert_eq!(synced.report.skipped[0].step, "rename document");
    assert_eq!(catalog.read(&catalog.document("go", "taken")).await, "keep me\n");
    assert!(catalog.document("go", "intro").exists());
}

/// Tenet: redistribution moves topics and rewrites their categoryId
#[tokio::test]
async fn reorder_across_categories() {
    let catalog = catalog_with(
        &["backend", "systems"],
        &[("backend", "go"), ("backend", "rust"), ("systems", "c")],
    )
    .await;

    let mut order = BTreeMap::new();
    order.insert("systems".to_string(), vec!["rust".to_string(), "c".to_string()]);
    let result = catalog
        .sync
        .reorder_topics_across_categories(&order)
        .await
        .unwrap();

    assert_eq!(slugs(&result.value[0]), vec!["go"]);
    assert_eq!(slugs(&result.value[1]), vec!["rust", "c"]);
    assert_eq!(result.value[1].items[0].category_id, "systems");
    assert_eq!(result.report.completed.iter().filter(|s| s.step == "update topic category").count(), 1);
    assert_eq!(catalog.sync.topic("rust").await.unwrap().category_id, "systems");
    assert_eq!(catalog.sync.categories().await.unwrap(), result.value);
}

/// Tenet: a topic listed twice aborts redistribution before any write
#[tokio::test]
async fn reorder_across_rejects_duplicates() {
    let catalog = catalog_with(&["backend", "systems"], &[("backend", "go")]).await;
    let index = catalog.category_index().await;

    let mut order = BTreeMap::new();
    order.insert("backend".to_string(), vec!["go".to_string()]);
    order.insert("systems".to_string(), vec!["go".to_string()]);
    let err = catalog
        .sync
        .reorder_topics_across_categories(&order)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Validation(ValidationError::DuplicateSlug(_))));

    let mut order = BTreeMap::new();
    order.insert("nowhere".to_string(), vec![]);
    let err = catalog
        .sync
        .reorder_topics_across_categories(&order)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::CategoryNotFound(_)));

    assert_eq!(catalog.category_index().await, index);
}

//! Testing utilities for the quire workspace
//!
//! Temporary catalogs and entity builders shared by integration tests.

#![allow(missing_docs)]

use quire_model::{Article, ArticleStatus, Chapter, NewTopic, Topic};
use quire_sync::{CatalogConfig, CatalogSync};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A catalog rooted in a temporary directory, removed on drop
pub struct TempCatalog {
    dir: TempDir,
    pub sync: CatalogSync,
}

impl TempCatalog {
    /// Empty directory, nothing created yet
    pub fn empty() -> Self {
        Self::with_config(&CatalogConfig::default())
    }

    pub fn with_config(config: &CatalogConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let sync = CatalogSync::from_config(dir.path(), config);
        Self { dir, sync }
    }

    /// Directories and empty index modules in place
    pub async fn new() -> Self {
        let catalog = Self::empty();
        catalog.sync.ensure_layout().await.unwrap();
        catalog
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    pub async fn read(&self, path: &Path) -> String {
        tokio::fs::read_to_string(path).await.unwrap()
    }

    pub async fn write(&self, path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.unwrap();
        }
        tokio::fs::write(path, contents).await.unwrap();
    }

    pub async fn category_index(&self) -> String {
        self.read(&self.sync.paths().category_index()).await
    }

    pub async fn data_index(&self) -> String {
        self.read(&self.sync.paths().data_index()).await
    }

    pub async fn topic_file(&self, slug: &str) -> String {
        self.read(&self.sync.paths().topic_file(slug)).await
    }

    pub fn document(&self, topic: &str, article: &str) -> PathBuf {
        self.sync.paths().document(topic, article)
    }
}

pub fn new_topic(name: &str, slug: &str) -> NewTopic {
    NewTopic {
        name: name.into(),
        slug: slug.into(),
        ..NewTopic::default()
    }
}

/// Article with no id yet, as a client sends a new one
pub fn article(slug: &str, title: &str) -> Article {
    Article {
        id: String::new(),
        slug: slug.into(),
        title: title.into(),
        summary: String::new(),
        status: ArticleStatus::Draft,
    }
}

pub fn chapter(title: &str, articles: Vec<Article>) -> Chapter {
    Chapter {
        id: String::new(),
        title: title.into(),
        description: String::new(),
        articles,
    }
}

pub fn topic(category_id: &str, name: &str, slug: &str, chapters: Vec<Chapter>) -> Topic {
    Topic {
        id: slug.into(),
        category_id: category_id.into(),
        name: name.into(),
        slug: slug.into(),
        description: String::new(),
        image: String::new(),
        chapters,
    }
}

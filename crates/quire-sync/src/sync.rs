//! Catalog synchronizer
//!
//! [`CatalogSync`] owns the write path to every catalog file. Each
//! mutating operation validates and computes all new file contents first,
//! then writes them in a fixed order through the [`FileGuard`].
//!
//! # Write order
//!
//! ```text
//! category index ──▶ per-topic file ──▶ data index ──▶ document files
//!   (required)         (required)        (varies)       (best effort)
//! ```
//!
//! A failure before the first write leaves every file untouched. A failure
//! in a best-effort step is recorded in the returned [`SyncReport`] and the
//! remaining steps still run.
//!
//! [`SyncReport`]: crate::report::SyncReport

use crate::config::CatalogConfig;
use crate::documents::{read_documents, Document};
use crate::error::{SyncError, SyncResult};
use crate::paths::CatalogPaths;
use crate::report::{Saga, Synced};
use crate::sources::{
    category_index_module, data_index_module, SourceFile, CONFIG_TYPES, DATA_TYPES,
    TOPICS_DATA_EXPORT,
};
use quire_guard::{BackupStore, FileGuard, LockManager};
use quire_model::{topic_binding, Category, Topic, TopicRef};
use quire_source::{Edit, Literal, Matcher, PatchOp, SourceModule};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Topic index entry with its article count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSummary {
    /// Index entry
    #[serde(flatten)]
    pub topic: TopicRef,
    /// Articles across all chapters
    pub article_count: usize,
}

/// Category with per-topic article counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    /// Category id
    pub id: String,
    /// Display title
    pub title: String,
    /// URL slug
    pub slug: String,
    /// Owned topics in order
    pub topics: Vec<TopicSummary>,
}

impl CategorySummary {
    /// Articles across all owned topics
    #[must_use]
    pub fn article_count(&self) -> usize {
        self.topics.iter().map(|t| t.article_count).sum()
    }
}

/// Entry point for every catalog read and write
#[derive(Debug, Clone)]
pub struct CatalogSync {
    paths: CatalogPaths,
    guard: FileGuard,
}

impl CatalogSync {
    /// Create a synchronizer over resolved paths and a file guard
    #[must_use]
    pub fn new(paths: CatalogPaths, guard: FileGuard) -> Self {
        Self { paths, guard }
    }

    /// Create a synchronizer with its own lock table
    #[must_use]
    pub fn from_config(root: impl Into<PathBuf>, config: &CatalogConfig) -> Self {
        let paths = CatalogPaths::new(root, config);
        let locks = Arc::new(LockManager::new(config.guard.lock_timeout()));
        let backups = BackupStore::new(paths.root(), paths.backup_dir());
        Self::new(paths, FileGuard::new(locks, backups))
    }

    /// Load `quire.toml` and environment overrides for `root`
    ///
    /// # Errors
    /// Returns [`SyncError::Config`] or [`SyncError::Io`].
    pub async fn open(root: &Path) -> SyncResult<Self> {
        let config = CatalogConfig::load_with_env(root).await?;
        Ok(Self::from_config(root, &config))
    }

    /// Resolved catalog paths
    #[inline]
    #[must_use]
    pub fn paths(&self) -> &CatalogPaths {
        &self.paths
    }

    /// Guard used for every write
    #[inline]
    #[must_use]
    pub fn guard(&self) -> &FileGuard {
        &self.guard
    }

    // ------------------------------------------------------------------
    // File access
    // ------------------------------------------------------------------

    pub(crate) async fn load_or(
        &self,
        path: &Path,
        template: impl FnOnce() -> SourceModule,
    ) -> SyncResult<SourceFile> {
        if exists(path).await? {
            SourceFile::load(path).await
        } else {
            Ok(SourceFile {
                path: path.to_path_buf(),
                module: template(),
            })
        }
    }

    pub(crate) async fn load_index(&self) -> SyncResult<SourceFile> {
        self.load_or(&self.paths.category_index(), category_index_module)
            .await
    }

    pub(crate) async fn load_data_index(&self) -> SyncResult<SourceFile> {
        self.load_or(&self.paths.data_index(), data_index_module).await
    }

    pub(crate) async fn load_topic_file(&self, slug: &str) -> SyncResult<Option<SourceFile>> {
        let path = self.paths.topic_file(slug);
        if exists(&path).await? {
            SourceFile::load(&path).await.map(Some)
        } else {
            Ok(None)
        }
    }

    pub(crate) async fn save(&self, file: &SourceFile) -> SyncResult<()> {
        self.write(&file.path, &file.render()).await
    }

    pub(crate) async fn write(&self, path: &Path, contents: &str) -> SyncResult<()> {
        self.guard.write(path, contents).await?;
        Ok(())
    }

    /// Root-relative form of `path` for reports
    pub(crate) fn target(&self, path: &Path) -> String {
        self.paths.display(path).to_string()
    }

    /// Rewrite `categoryId` in one per-topic file
    pub(crate) async fn set_topic_category(&self, slug: &str, category_id: &str) -> SyncResult<()> {
        let mut file = self
            .load_topic_file(slug)
            .await?
            .ok_or_else(|| SyncError::TopicNotFound(slug.to_string()))?;
        let binding = file.topic_binding(slug)?;
        file.apply(
            &binding,
            Edit::Patch(vec![PatchOp::set("categoryId", Literal::string(category_id))]),
        )?;
        self.save(&file).await
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Current categories in display order
    ///
    /// # Errors
    /// Returns a structural error when the category index is unreadable.
    pub async fn categories(&self) -> SyncResult<Vec<Category>> {
        self.load_index().await?.categories()
    }

    /// Categories with article counts read from every topic file.
    ///
    /// A topic whose file can not be read counts zero articles.
    ///
    /// # Errors
    /// Returns a structural error when the category index is unreadable.
    pub async fn category_summaries(&self) -> SyncResult<Vec<CategorySummary>> {
        let mut summaries = Vec::new();
        for category in self.categories().await? {
            let mut topics = Vec::with_capacity(category.items.len());
            for topic in category.items {
                let article_count = match self.topic(&topic.slug).await {
                    Ok(detail) => detail.article_count(),
                    Err(e) => {
                        warn!("counting articles of {}: {}", topic.slug, e);
                        0
                    }
                };
                topics.push(TopicSummary {
                    topic,
                    article_count,
                });
            }
            summaries.push(CategorySummary {
                id: category.id,
                title: category.title,
                slug: category.slug,
                topics,
            });
        }
        Ok(summaries)
    }

    /// Detail of one topic
    ///
    /// # Errors
    /// Returns [`SyncError::TopicNotFound`] when the topic has no data file.
    pub async fn topic(&self, slug: &str) -> SyncResult<Topic> {
        self.load_topic_file(slug)
            .await?
            .ok_or_else(|| SyncError::TopicNotFound(slug.to_string()))?
            .topic(slug)
    }

    /// Parsed documents of one topic, by slug
    ///
    /// # Errors
    /// Returns [`SyncError::Io`] or [`SyncError::FrontMatter`].
    pub async fn list_documents(&self, topic: &str) -> SyncResult<Vec<Document>> {
        read_documents(&self.paths.document_dir(topic), self.paths.extension()).await
    }

    /// Snapshots of a catalog file, oldest first
    ///
    /// # Errors
    /// Returns [`SyncError::Guard`] when the backup directory can not be read.
    pub async fn list_backups(&self, path: &Path) -> SyncResult<Vec<PathBuf>> {
        let path = self.resolve(path);
        Ok(self.guard.backups().list(&path).await?)
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Create the catalog directories and empty index modules when absent
    ///
    /// # Errors
    /// Returns the first failed directory or file creation.
    pub async fn ensure_layout(&self) -> SyncResult<Synced<()>> {
        let mut saga = Saga::new("ensure layout");
        for dir in [
            self.paths.articles_dir(),
            self.paths.topics_config_dir(),
            self.paths.topics_data_dir(),
        ] {
            saga.required("create directory", self.target(dir), async {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| SyncError::io_error(dir, e))
            })
            .await?;
        }

        let files = [
            (self.paths.category_index(), category_index_module().render()),
            (self.paths.data_index(), data_index_module().render()),
            (self.paths.topics_config_dir().join("types.ts"), CONFIG_TYPES.to_string()),
            (self.paths.topics_data_dir().join("types.ts"), DATA_TYPES.to_string()),
        ];
        for (path, contents) in &files {
            let created = self.guard.create(path, contents).await?;
            if created {
                saga.record("create file", self.target(path));
            }
        }
        info!("catalog layout ready under {}", self.paths.root().display());
        Ok(saga.finish(()))
    }

    /// Restore a catalog file from its most recent snapshot
    ///
    /// Relative paths are resolved against the catalog root.
    ///
    /// # Errors
    /// Returns [`SyncError::Guard`] wrapping `NoBackupFound` when there is
    /// nothing to restore.
    pub async fn restore(&self, path: &Path) -> SyncResult<PathBuf> {
        let path = self.resolve(path);
        let snapshot = self.guard.restore(&path).await?;
        info!("restored {}", self.target(&path));
        Ok(snapshot)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.paths.root().join(path)
        }
    }

    // ------------------------------------------------------------------
    // Data index registration
    // ------------------------------------------------------------------

    /// Ensure `slug` is imported and mapped in the data index.
    /// Returns whether the module changed.
    pub(crate) fn register_topic(
        file: &mut SourceFile,
        slug: &str,
        binding: &str,
    ) -> SyncResult<bool> {
        let mapped = file
            .module
            .read(TOPICS_DATA_EXPORT)
            .map_err(|e| SyncError::source_error(&file.path, e))?
            .as_object()
            .and_then(|map| map.get(slug))
            .and_then(|value| match value {
                Literal::Identifier(name) => Some(name.clone()),
                _ => None,
            });
        let binding = mapped.clone().unwrap_or_else(|| binding.to_string());
        let imported = file.module.add_named_import(&binding, &format!("./{slug}"));
        if mapped.is_none() {
            file.apply(
                TOPICS_DATA_EXPORT,
                Edit::InsertEntry {
                    key: slug.to_string(),
                    value: Literal::ident(binding),
                },
            )?;
        }
        Ok(imported || mapped.is_none())
    }

    /// Drop `slug` from the data index map and its import.
    /// Returns whether the module changed.
    pub(crate) fn unregister_topic(file: &mut SourceFile, slug: &str) -> SyncResult<bool> {
        let binding = file
            .module
            .read(TOPICS_DATA_EXPORT)
            .map_err(|e| SyncError::source_error(&file.path, e))?
            .as_object()
            .and_then(|map| map.get(slug))
            .and_then(|value| match value {
                Literal::Identifier(name) => Some(name.clone()),
                _ => None,
            })
            .unwrap_or_else(|| topic_binding(slug));
        let outcome = file.apply(TOPICS_DATA_EXPORT, Edit::DeleteWhere(Matcher::key(slug)))?;
        let removed = file.module.remove_import_binding(&binding);
        Ok(outcome.affected > 0 || removed)
    }
}

pub(crate) async fn exists(path: &Path) -> SyncResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| SyncError::io_error(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn data_index_registration() {
        let mut file = SourceFile {
            path: PathBuf::from("data/index.ts"),
            module: data_index_module(),
        };
        assert!(CatalogSync::register_topic(&mut file, "go", "goTopic").unwrap());
        assert!(!CatalogSync::register_topic(&mut file, "go", "goTopic").unwrap());
        assert_eq!(
            file.render(),
            "import { goTopic } from './go'\nimport type { TopicsData } from './types'\n\nexport const topicsData: TopicsData = {\n  go: goTopic\n}\n\nexport type { Article, Chapter, Topic, TopicsData } from './types'\n"
        );

        assert!(CatalogSync::unregister_topic(&mut file, "go").unwrap());
        assert_eq!(file.render(), data_index_module().render());
        assert!(!CatalogSync::unregister_topic(&mut file, "go").unwrap());
    }

    #[tokio::test]
    async fn ensure_layout_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let sync = CatalogSync::from_config(tmp.path(), &CatalogConfig::default());

        let first = sync.ensure_layout().await.unwrap();
        let created: Vec<_> = first
            .report
            .completed
            .iter()
            .filter(|s| s.step == "create file")
            .collect();
        assert_eq!(created.len(), 4);
        assert!(sync.categories().await.unwrap().is_empty());

        let second = sync.ensure_layout().await.unwrap();
        assert!(second.report.completed.iter().all(|s| s.step != "create file"));
    }

    #[tokio::test]
    async fn missing_topic_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let sync = CatalogSync::from_config(tmp.path(), &CatalogConfig::default());
        assert!(matches!(
            sync.topic("nope").await,
            Err(SyncError::TopicNotFound(ref s)) if s == "nope"
        ));
        assert!(sync.list_documents("nope").await.unwrap().is_empty());
    }
}

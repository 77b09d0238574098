//! Resolved catalog file locations

use crate::config::CatalogConfig;
use std::path::{Path, PathBuf};

/// Absolute locations of every catalog file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPaths {
    root: PathBuf,
    articles: PathBuf,
    topics_config: PathBuf,
    topics_data: PathBuf,
    backups: PathBuf,
    index_file: String,
    extension: String,
}

impl CatalogPaths {
    /// Resolve `config` against `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, config: &CatalogConfig) -> Self {
        let root = root.into();
        let layout = &config.layout;
        Self {
            articles: root.join(&layout.articles_dir),
            topics_config: root.join(&layout.topics_config_dir),
            topics_data: root.join(&layout.topics_data_dir),
            backups: root.join(&config.guard.backup_dir),
            index_file: layout.index_file.clone(),
            extension: layout.document_extension.trim_start_matches('.').to_string(),
            root,
        }
    }

    /// Catalog root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Document directory
    #[inline]
    #[must_use]
    pub fn articles_dir(&self) -> &Path {
        &self.articles
    }

    /// Directory of the category index
    #[inline]
    #[must_use]
    pub fn topics_config_dir(&self) -> &Path {
        &self.topics_config
    }

    /// Directory of the data index and per-topic directories
    #[inline]
    #[must_use]
    pub fn topics_data_dir(&self) -> &Path {
        &self.topics_data
    }

    /// Snapshot directory
    #[inline]
    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        &self.backups
    }

    /// Document file extension
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Category index module
    #[must_use]
    pub fn category_index(&self) -> PathBuf {
        self.topics_config.join(&self.index_file)
    }

    /// Topic-data index module
    #[must_use]
    pub fn data_index(&self) -> PathBuf {
        self.topics_data.join(&self.index_file)
    }

    /// Directory of one topic's data module
    #[must_use]
    pub fn topic_dir(&self, slug: &str) -> PathBuf {
        self.topics_data.join(slug)
    }

    /// Per-topic data module
    #[must_use]
    pub fn topic_file(&self, slug: &str) -> PathBuf {
        self.topic_dir(slug).join(&self.index_file)
    }

    /// Directory of one topic's documents
    #[must_use]
    pub fn document_dir(&self, topic: &str) -> PathBuf {
        self.articles.join(topic)
    }

    /// Document of one article
    #[must_use]
    pub fn document(&self, topic: &str, article: &str) -> PathBuf {
        self.document_dir(topic)
            .join(format!("{article}.{}", self.extension))
    }

    /// Path relative to the root, for messages
    #[must_use]
    pub fn display<'a>(&self, path: &'a Path) -> std::path::Display<'a> {
        path.strip_prefix(&self.root).unwrap_or(path).display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_layout() {
        let paths = CatalogPaths::new("/site", &CatalogConfig::default());
        assert_eq!(
            paths.category_index(),
            PathBuf::from("/site/.vitepress/topics/config/index.ts")
        );
        assert_eq!(
            paths.topic_file("go"),
            PathBuf::from("/site/.vitepress/topics/data/go/index.ts")
        );
        assert_eq!(paths.document("go", "intro"), PathBuf::from("/site/articles/go/intro.md"));
        assert_eq!(paths.backup_dir(), Path::new("/site/.quire/backups"));
        assert_eq!(paths.display(&paths.data_index()).to_string(), ".vitepress/topics/data/index.ts");
    }

    #[test]
    fn extension_dot_is_optional() {
        let mut config = CatalogConfig::default();
        config.layout.document_extension = ".mdx".into();
        let paths = CatalogPaths::new("/site", &config);
        assert_eq!(paths.document("go", "a"), PathBuf::from("/site/articles/go/a.mdx"));
    }
}

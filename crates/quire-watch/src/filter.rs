//! Which paths are reported, and under what name

use quire_sync::CatalogPaths;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Maps absolute event paths to root-relative notification paths.
///
/// A path is reported when it lies below a watched directory, outside every
/// excluded directory, and no component below the watched directory starts
/// with `.`.
#[derive(Debug, Clone)]
pub struct WatchFilter {
    root: PathBuf,
    watched: Vec<PathBuf>,
    excluded: Vec<PathBuf>,
}

impl WatchFilter {
    /// Filter reporting paths relative to `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            watched: Vec::new(),
            excluded: Vec::new(),
        }
    }

    /// Catalog source directories, with the backup directory excluded.
    ///
    /// `root` replaces the configured root, so a canonical form can be used
    /// to match what the platform watcher reports.
    #[must_use]
    pub fn for_catalog(paths: &CatalogPaths, root: &Path) -> Self {
        let rebase = |dir: &Path| match dir.strip_prefix(paths.root()) {
            Ok(relative) => root.join(relative),
            Err(_) => dir.to_path_buf(),
        };
        Self::new(root)
            .watch(rebase(paths.topics_config_dir()))
            .watch(rebase(paths.topics_data_dir()))
            .watch(rebase(paths.articles_dir()))
            .exclude(rebase(paths.backup_dir()))
    }

    /// Report changes below `dir`
    #[must_use]
    pub fn watch(mut self, dir: impl Into<PathBuf>) -> Self {
        self.watched.push(dir.into());
        self
    }

    /// Never report changes below `dir`
    #[must_use]
    pub fn exclude(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded.push(dir.into());
        self
    }

    /// Directories to register with the platform watcher
    #[inline]
    #[must_use]
    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }

    /// Root-relative, `/`-separated name of `path`, or `None` if filtered
    #[must_use]
    pub fn relative(&self, path: &Path) -> Option<String> {
        if self.excluded.iter().any(|dir| path.starts_with(dir)) {
            return None;
        }
        let base = self
            .watched
            .iter()
            .filter(|dir| path.starts_with(dir))
            .max_by_key(|dir| dir.components().count())?;
        let below = path.strip_prefix(base).ok()?;
        if below.components().any(|c| is_hidden(&c)) {
            return None;
        }

        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }

    /// Every reportable file currently present under the watched directories
    #[must_use]
    pub fn scan(&self) -> HashSet<String> {
        let mut found = HashSet::new();
        let mut pending: Vec<PathBuf> = self.watched.clone();
        while let Some(dir) = pending.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("skip scanning {}: {}", dir.display(), e);
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                let Some(relative) = self.relative(&path) else {
                    continue;
                };
                match entry.file_type() {
                    Ok(kind) if kind.is_dir() => pending.push(path),
                    Ok(_) => {
                        found.insert(relative);
                    }
                    Err(_) => {}
                }
            }
        }
        found
    }
}

fn is_hidden(component: &Component<'_>) -> bool {
    matches!(component, Component::Normal(name) if name.to_string_lossy().starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quire_sync::CatalogConfig;

    fn filter() -> WatchFilter {
        let paths = CatalogPaths::new("/site", &CatalogConfig::default());
        WatchFilter::for_catalog(&paths, Path::new("/site"))
    }

    #[test]
    fn reports_paths_below_watched_dirs() {
        let filter = filter();
        assert_eq!(
            filter.relative(Path::new("/site/articles/go/intro.md")).as_deref(),
            Some("articles/go/intro.md")
        );
        assert_eq!(
            filter
                .relative(Path::new("/site/.vitepress/topics/data/go/index.ts"))
                .as_deref(),
            Some(".vitepress/topics/data/go/index.ts")
        );
    }

    #[test]
    fn ignores_hidden_entries_and_outsiders() {
        let filter = filter();
        assert_eq!(filter.relative(Path::new("/site/articles/go/.intro.md.quire-tmp")), None);
        assert_eq!(filter.relative(Path::new("/site/articles/.drafts/a.md")), None);
        assert_eq!(filter.relative(Path::new("/site/README.md")), None);
        assert_eq!(filter.relative(Path::new("/elsewhere/articles/a.md")), None);
    }

    #[test]
    fn ignores_backups_inside_watched_dirs() {
        let filter = WatchFilter::new("/site")
            .watch("/site/articles")
            .exclude("/site/articles/backups");
        assert_eq!(filter.relative(Path::new("/site/articles/backups/a.md.bak")), None);
        assert!(filter.relative(Path::new("/site/articles/a.md")).is_some());
    }

    #[test]
    fn scan_lists_visible_files() {
        let dir = tempfile::tempdir().unwrap();
        let articles = dir.path().join("articles");
        std::fs::create_dir_all(articles.join("go")).unwrap();
        std::fs::write(articles.join("go/intro.md"), "x").unwrap();
        std::fs::write(articles.join("go/.hidden.md"), "x").unwrap();

        let filter = WatchFilter::new(dir.path()).watch(&articles);
        let found = filter.scan();
        assert_eq!(found.len(), 1);
        assert!(found.contains("articles/go/intro.md"));
    }
}

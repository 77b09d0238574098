//! Catalog configuration
//!
//! Read from `quire.toml` at the catalog root. Every field has a default,
//! so a missing file or a partial one is fine. Environment variables with
//! the `QUIRE_` prefix override the file.
//!
//! ```toml
//! [layout]
//! articles_dir = "articles"
//! topics_config_dir = ".vitepress/topics/config"
//! topics_data_dir = ".vitepress/topics/data"
//!
//! [guard]
//! lock_timeout_secs = 30
//! backup_dir = ".quire/backups"
//!
//! [watch]
//! debounce_ms = 300
//! ```

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Name of the configuration file at the catalog root
pub const CONFIG_FILE: &str = "quire.toml";

/// Full catalog configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Where the catalog files live
    pub layout: LayoutConfig,
    /// Lock and backup settings
    pub guard: GuardConfig,
    /// Change broadcaster settings
    pub watch: WatchConfig,
}

/// Directory layout, relative to the catalog root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Document files, one subdirectory per topic
    pub articles_dir: PathBuf,
    /// Directory holding the category index
    pub topics_config_dir: PathBuf,
    /// Directory holding the data index and per-topic directories
    pub topics_data_dir: PathBuf,
    /// File name of every index module
    pub index_file: String,
    /// Document file extension, without the dot
    pub document_extension: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            articles_dir: PathBuf::from("articles"),
            topics_config_dir: PathBuf::from(".vitepress/topics/config"),
            topics_data_dir: PathBuf::from(".vitepress/topics/data"),
            index_file: "index.ts".into(),
            document_extension: "md".into(),
        }
    }
}

/// Lock and backup settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Seconds before a held lock expires
    pub lock_timeout_secs: u64,
    /// Snapshot directory
    pub backup_dir: PathBuf,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            lock_timeout_secs: 30,
            backup_dir: PathBuf::from(".quire/backups"),
        }
    }
}

impl GuardConfig {
    /// Lock expiry as a duration
    #[inline]
    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }
}

/// Change broadcaster settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Whether `watch` is allowed to start
    pub enabled: bool,
    /// Per-path coalescing window, `0` disables it
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 300,
        }
    }
}

impl WatchConfig {
    /// Debounce window as a duration
    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl CatalogConfig {
    /// Parse configuration text
    ///
    /// # Errors
    /// Returns [`SyncError::Config`] for malformed TOML.
    pub fn from_toml(text: &str, origin: &Path) -> SyncResult<Self> {
        toml::from_str(text).map_err(|e| SyncError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load `<root>/quire.toml`, falling back to defaults when absent
    ///
    /// # Errors
    /// Returns [`SyncError::Config`] for malformed TOML and
    /// [`SyncError::Io`] when the file exists but can not be read.
    pub async fn load(root: &Path) -> SyncResult<Self> {
        let path = root.join(CONFIG_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                info!("loaded configuration from {}", path.display());
                Self::from_toml(&text, &path)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no {} under {}, using defaults", CONFIG_FILE, root.display());
                Ok(Self::default())
            }
            Err(e) => Err(SyncError::io_error(path, e)),
        }
    }

    /// Load the file, then apply `QUIRE_*` environment overrides
    ///
    /// # Errors
    /// Same as [`CatalogConfig::load`], plus [`SyncError::Config`] for
    /// non-numeric numeric overrides.
    pub async fn load_with_env(root: &Path) -> SyncResult<Self> {
        let mut config = Self::load(root).await?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides read through `lookup`
    ///
    /// # Errors
    /// Returns [`SyncError::Config`] when a numeric override does not parse.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> SyncResult<()> {
        if let Some(dir) = lookup("QUIRE_ARTICLES_DIR") {
            self.layout.articles_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("QUIRE_BACKUP_DIR") {
            self.guard.backup_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("QUIRE_LOCK_TIMEOUT_SECS") {
            self.guard.lock_timeout_secs = parse_number("QUIRE_LOCK_TIMEOUT_SECS", &secs)?;
        }
        if let Some(ms) = lookup("QUIRE_WATCH_DEBOUNCE_MS") {
            self.watch.debounce_ms = parse_number("QUIRE_WATCH_DEBOUNCE_MS", &ms)?;
        }
        Ok(())
    }
}

fn parse_number(var: &str, value: &str) -> SyncResult<u64> {
    value.trim().parse().map_err(|_| SyncError::Config {
        path: PathBuf::from(var),
        message: format!("expected a non-negative integer, got '{value}'"),
    })
}

/// Catalog root from `QUIRE_ROOT`, then `PROJECT_ROOT`, then the working directory
///
/// # Errors
/// Returns [`SyncError::Io`] when the working directory is unavailable.
pub fn resolve_root(explicit: Option<&Path>) -> SyncResult<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root.to_path_buf());
    }
    for var in ["QUIRE_ROOT", "PROJECT_ROOT"] {
        if let Ok(root) = std::env::var(var) {
            if !root.is_empty() {
                return Ok(PathBuf::from(root));
            }
        }
    }
    std::env::current_dir().map_err(|e| SyncError::io_error(".", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = CatalogConfig::from_toml(
            "[layout]\narticles_dir = \"docs/articles\"\n\n[watch]\ndebounce_ms = 0\n",
            Path::new("quire.toml"),
        )
        .unwrap();
        assert_eq!(config.layout.articles_dir, PathBuf::from("docs/articles"));
        assert_eq!(config.layout.index_file, "index.ts");
        assert_eq!(config.guard, GuardConfig::default());
        assert_eq!(config.watch.debounce(), Duration::ZERO);
        assert!(config.watch.enabled);
    }

    #[test]
    fn malformed_file_names_its_path() {
        let err = CatalogConfig::from_toml("[layout\n", Path::new("quire.toml")).unwrap_err();
        assert!(matches!(err, SyncError::Config { ref path, .. } if path == Path::new("quire.toml")));
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("QUIRE_ARTICLES_DIR", "posts"),
            ("QUIRE_LOCK_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .collect();
        let mut config = CatalogConfig::default();
        config
            .apply_env(|k| env.get(k).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.layout.articles_dir, PathBuf::from("posts"));
        assert_eq!(config.guard.lock_timeout(), Duration::from_secs(5));
        assert_eq!(config.guard.backup_dir, PathBuf::from(".quire/backups"));
    }

    #[test]
    fn non_numeric_override_is_rejected() {
        let mut config = CatalogConfig::default();
        let err = config
            .apply_env(|k| (k == "QUIRE_WATCH_DEBOUNCE_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, SyncError::Config { .. }));
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(CatalogConfig::load(tmp.path()).await.unwrap(), CatalogConfig::default());
    }
}

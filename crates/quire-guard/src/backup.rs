//! Timestamped snapshots
//!
//! A snapshot of `<dir>/<file>` is written to
//! `<backup_dir>/<dir relative to root>/<file>.<stamp>.bak`, where the
//! stamp is an RFC 3339 UTC time with `:` and `.` replaced by `-`. The
//! stamp has a fixed width, so the lexicographically greatest name is the
//! most recent snapshot.

use crate::error::{GuardError, GuardResult};
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SUFFIX: &str = ".bak";

/// Snapshot file name for `file_name` taken at `at`
#[must_use]
pub fn snapshot_name(file_name: &str, at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Micros, true)
        .replace([':', '.'], "-");
    format!("{file_name}.{stamp}{SUFFIX}")
}

/// Snapshot store rooted at a fixed directory
#[derive(Debug, Clone)]
pub struct BackupStore {
    root: PathBuf,
    dir: PathBuf,
}

impl BackupStore {
    /// Store snapshots of files under `root` into `dir`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dir: dir.into(),
        }
    }

    /// Backup directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot(&self, path: &Path) -> GuardResult<(PathBuf, String)> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                GuardError::io_error(
                    path,
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
                )
            })?
            .to_string();
        let parent = path
            .parent()
            .and_then(|p| p.strip_prefix(&self.root).ok())
            .unwrap_or_else(|| Path::new(""));
        Ok((self.dir.join(parent), file_name))
    }

    /// Copy the current content of `path` into a new snapshot
    ///
    /// # Errors
    /// Returns [`GuardError::Io`] when the file can not be read or the
    /// snapshot can not be written.
    pub async fn backup(&self, path: &Path) -> GuardResult<PathBuf> {
        let (dir, file_name) = self.slot(path)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| GuardError::io_error(&dir, e))?;
        let snapshot = dir.join(snapshot_name(&file_name, Utc::now()));
        tokio::fs::copy(path, &snapshot)
            .await
            .map_err(|e| GuardError::io_error(path, e))?;
        debug!("backed up {} to {}", path.display(), snapshot.display());
        Ok(snapshot)
    }

    /// Snapshots of `path`, oldest first
    ///
    /// # Errors
    /// Returns [`GuardError::Io`] when the backup directory can not be listed.
    pub async fn list(&self, path: &Path) -> GuardResult<Vec<PathBuf>> {
        let (dir, file_name) = self.slot(path)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(GuardError::io_error(&dir, e)),
        };

        let prefix = format!("{file_name}.");
        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| GuardError::io_error(&dir, e))?
        {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let is_snapshot = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(SUFFIX))
                .is_some_and(|stamp| !stamp.is_empty() && !stamp.contains('.'));
            if is_snapshot {
                names.push(name);
            }
        }
        names.sort();
        Ok(names.into_iter().map(|n| dir.join(n)).collect())
    }

    /// Overwrite `path` with its most recent snapshot
    ///
    /// # Errors
    /// Returns [`GuardError::NoBackupFound`] when no snapshot exists.
    pub async fn restore(&self, path: &Path) -> GuardResult<PathBuf> {
        let latest = self
            .list(path)
            .await?
            .pop()
            .ok_or_else(|| GuardError::NoBackupFound(path.to_path_buf()))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| GuardError::io_error(parent, e))?;
        }
        tokio::fs::copy(&latest, path)
            .await
            .map_err(|e| GuardError::io_error(path, e))?;
        info!("restored {} from {}", path.display(), latest.display());
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn snapshot_name_strips_separators() {
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            snapshot_name("index.ts", at),
            "index.ts.2026-03-04T05-06-07-000000Z.bak"
        );
    }

    #[tokio::test]
    async fn restore_picks_latest_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let store = BackupStore::new(root, root.join(".backups"));
        let file = root.join("config").join("index.ts");
        tokio::fs::create_dir_all(file.parent().unwrap()).await.unwrap();

        tokio::fs::write(&file, "one").await.unwrap();
        store.backup(&file).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        tokio::fs::write(&file, "two").await.unwrap();
        let second = store.backup(&file).await.unwrap();
        tokio::fs::write(&file, "broken").await.unwrap();

        let snapshots = store.list(&file).await.unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1], second);
        assert!(second.starts_with(root.join(".backups").join("config")));

        assert_eq!(store.restore(&file).await.unwrap(), second);
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "two");
    }

    #[tokio::test]
    async fn same_name_in_other_directory_is_separate() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let store = BackupStore::new(root, root.join(".backups"));
        let a = root.join("config").join("index.ts");
        let b = root.join("data").join("index.ts");
        for path in [&a, &b] {
            tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
            tokio::fs::write(path, "x").await.unwrap();
        }
        store.backup(&a).await.unwrap();

        assert_eq!(store.list(&a).await.unwrap().len(), 1);
        assert!(store.list(&b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn restore_without_snapshot_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BackupStore::new(tmp.path(), tmp.path().join(".backups"));
        let err = store.restore(&tmp.path().join("index.ts")).await.unwrap_err();
        assert!(matches!(err, GuardError::NoBackupFound(_)));
    }
}

//! Guarded file operations
//!
//! [`FileGuard`] combines the lock table and the snapshot store into the
//! write path every catalog mutation goes through.

use crate::backup::BackupStore;
use crate::error::{GuardError, GuardResult};
use crate::lock::LockManager;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Lock-protected, backed-up file writes
#[derive(Debug, Clone)]
pub struct FileGuard {
    locks: Arc<LockManager>,
    backups: BackupStore,
}

impl FileGuard {
    /// Create a guard over a shared lock table
    #[must_use]
    pub fn new(locks: Arc<LockManager>, backups: BackupStore) -> Self {
        Self { locks, backups }
    }

    /// Shared lock table
    #[inline]
    #[must_use]
    pub fn locks(&self) -> &Arc<LockManager> {
        &self.locks
    }

    /// Snapshot store
    #[inline]
    #[must_use]
    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    /// Lock, snapshot the current content, write, release.
    ///
    /// The content is staged in a hidden sibling and renamed into place.
    ///
    /// # Errors
    /// Returns [`GuardError::AlreadyLocked`] when another writer holds the
    /// path, or [`GuardError::Io`] when any file step fails.
    pub async fn write(&self, path: &Path, contents: &str) -> GuardResult<()> {
        let _lock = self.locks.acquire(path)?;

        if exists(path).await? {
            self.backups.backup(path).await?;
        } else if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| GuardError::io_error(parent, e))?;
        }

        let staged = staging_path(path);
        tokio::fs::write(&staged, contents)
            .await
            .map_err(|e| GuardError::io_error(&staged, e))?;
        if let Err(e) = tokio::fs::rename(&staged, path).await {
            let _ = tokio::fs::remove_file(&staged).await;
            return Err(GuardError::io_error(path, e));
        }
        info!("wrote {}", path.display());
        Ok(())
    }

    /// Write only when `path` does not exist yet. Returns whether it wrote.
    ///
    /// # Errors
    /// Same as [`FileGuard::write`].
    pub async fn create(&self, path: &Path, contents: &str) -> GuardResult<bool> {
        if exists(path).await? {
            return Ok(false);
        }
        self.write(path, contents).await?;
        Ok(true)
    }

    /// Snapshot then delete a file. Returns `false` when it was already gone.
    ///
    /// # Errors
    /// Returns [`GuardError::AlreadyLocked`] or [`GuardError::Io`].
    pub async fn remove_file(&self, path: &Path) -> GuardResult<bool> {
        let _lock = self.locks.acquire(path)?;
        if !exists(path).await? {
            return Ok(false);
        }
        self.backups.backup(path).await?;
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| GuardError::io_error(path, e))?;
        info!("removed {}", path.display());
        Ok(true)
    }

    /// Delete a directory tree. Returns `false` when it was already gone.
    ///
    /// # Errors
    /// Returns [`GuardError::AlreadyLocked`] or [`GuardError::Io`].
    pub async fn remove_dir_all(&self, path: &Path) -> GuardResult<bool> {
        let _lock = self.locks.acquire(path)?;
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => {
                info!("removed directory {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(GuardError::io_error(path, e)),
        }
    }

    /// Move `from` to `to`, never replacing an existing target
    ///
    /// # Errors
    /// Returns [`GuardError::TargetExists`] when `to` is present, plus the
    /// lock and IO failures of the other operations.
    pub async fn rename(&self, from: &Path, to: &Path) -> GuardResult<()> {
        let _from = self.locks.acquire(from)?;
        let _to = self.locks.acquire(to)?;
        if exists(to).await? {
            return Err(GuardError::TargetExists(to.to_path_buf()));
        }
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| GuardError::io_error(parent, e))?;
        }
        tokio::fs::rename(from, to)
            .await
            .map_err(|e| GuardError::io_error(from, e))?;
        debug!("renamed {} to {}", from.display(), to.display());
        Ok(())
    }

    /// Restore `path` from its latest snapshot under the path's lock
    ///
    /// # Errors
    /// Returns [`GuardError::NoBackupFound`] when there is nothing to restore.
    pub async fn restore(&self, path: &Path) -> GuardResult<PathBuf> {
        let _lock = self.locks.acquire(path)?;
        self.backups.restore(path).await
    }
}

async fn exists(path: &Path) -> GuardResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| GuardError::io_error(path, e))
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.quire-tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn guard(root: &Path) -> FileGuard {
        FileGuard::new(
            Arc::new(LockManager::default()),
            BackupStore::new(root, root.join(".quire/backups")),
        )
    }

    #[tokio::test]
    async fn write_snapshots_previous_content() {
        let tmp = tempfile::tempdir().unwrap();
        let guard = guard(tmp.path());
        let path = tmp.path().join("data/go/index.ts");

        guard.write(&path, "first").await.unwrap();
        assert!(guard.backups().list(&path).await.unwrap().is_empty());

        guard.write(&path, "second").await.unwrap();
        let snapshots = guard.backups().list(&path).await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(tokio::fs::read_to_string(&snapshots[0]).await.unwrap(), "first");
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "second");
        assert!(!guard.locks().is_locked(&path));
    }

    #[tokio::test]
    async fn write_fails_while_locked() {
        let tmp = tempfile::tempdir().unwrap();
        let guard = guard(tmp.path());
        let path = tmp.path().join("index.ts");

        let held = guard.locks().acquire(&path).unwrap();
        let err = guard.write(&path, "x").await.unwrap_err();
        assert!(err.is_contention());
        assert!(!path.exists());

        drop(held);
        guard.write(&path, "x").await.unwrap();
    }

    #[tokio::test]
    async fn rename_refuses_existing_target() {
        let tmp = tempfile::tempdir().unwrap();
        let guard = guard(tmp.path());
        let a = tmp.path().join("a.md");
        let b = tmp.path().join("b.md");
        guard.write(&a, "a").await.unwrap();
        guard.write(&b, "b").await.unwrap();

        let err = guard.rename(&a, &b).await.unwrap_err();
        assert!(matches!(err, GuardError::TargetExists(_)));
        assert_eq!(tokio::fs::read_to_string(&b).await.unwrap(), "b");

        let c = tmp.path().join("nested/c.md");
        guard.rename(&a, &c).await.unwrap();
        assert!(!a.exists());
        assert_eq!(tokio::fs::read_to_string(&c).await.unwrap(), "a");
    }

    #[tokio::test]
    async fn remove_then_restore() {
        let tmp = tempfile::tempdir().unwrap();
        let guard = guard(tmp.path());
        let path = tmp.path().join("doc.md");
        guard.write(&path, "body").await.unwrap();

        assert!(guard.remove_file(&path).await.unwrap());
        assert!(!guard.remove_file(&path).await.unwrap());
        guard.restore(&path).await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "body");
    }

    #[tokio::test]
    async fn create_keeps_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let guard = guard(tmp.path());
        let path = tmp.path().join("a/b.md");
        assert!(guard.create(&path, "one").await.unwrap());
        assert!(!guard.create(&path, "two").await.unwrap());
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "one");
    }
}

//! Error types for locking and backups

use std::path::PathBuf;

/// Errors from the guard layer
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// Another writer holds the lock
    #[error("file is locked by another writer: {}", .0.display())]
    AlreadyLocked(PathBuf),

    /// No snapshot exists for the file
    #[error("no backup found for {}", .0.display())]
    NoBackupFound(PathBuf),

    /// Rename target is already present
    #[error("refusing to overwrite existing file: {}", .0.display())]
    TargetExists(PathBuf),

    /// IO error on a guarded path
    #[error("io error on {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl GuardError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether a retry may succeed once the current holder is done
    #[must_use]
    pub fn is_contention(&self) -> bool {
        matches!(self, Self::AlreadyLocked(_))
    }
}

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

//! Error types for the change broadcaster

use std::path::PathBuf;

/// Errors from watching and broadcasting
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The platform watcher could not be created
    #[error("failed to create filesystem watcher: {0}")]
    Create(#[source] notify::Error),

    /// A directory could not be watched
    #[error("failed to watch {}: {source}", path.display())]
    Watch {
        /// Directory being registered
        path: PathBuf,
        /// Underlying error
        #[source]
        source: notify::Error,
    },

    /// The catalog root could not be resolved
    #[error("io error on {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A notification could not be serialized
    #[error("failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),
}

impl WatchError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for watch operations
pub type WatchResult<T> = Result<T, WatchError>;

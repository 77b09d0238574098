//! Error types for catalog synchronization
//!
//! Classification follows how an operator should react:
//! - structural: a source file can not be read as the catalog schema, no retry
//! - recoverable: input or precondition problem the caller can correct
//! - contention: another writer holds a file, retry later

use quire_guard::GuardError;
use quire_model::ValidationError;
use quire_source::SourceError;
use std::path::PathBuf;

/// Main synchronizer error type
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A catalog source file is not usable
    #[error("{}: {source}", path.display())]
    Source {
        /// Offending file
        path: PathBuf,
        /// Underlying structural error
        #[source]
        source: SourceError,
    },

    /// A declaration does not hold the expected catalog data
    #[error("{}: invalid catalog data: {source}", path.display())]
    Data {
        /// Offending file
        path: PathBuf,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },

    /// A document's front matter is malformed
    #[error("{}: invalid front matter: {source}", path.display())]
    FrontMatter {
        /// Offending document
        path: PathBuf,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// IO error on a catalog path
    #[error("io error on {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Lock or backup failure
    #[error(transparent)]
    Guard(#[from] GuardError),

    /// Input rejected before any write
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Malformed configuration
    #[error("configuration error in {}: {message}", path.display())]
    Config {
        /// File or variable holding the bad value
        path: PathBuf,
        /// What is wrong
        message: String,
    },

    /// No category with this id
    #[error("category not found: {0}")]
    CategoryNotFound(String),

    /// No topic with this slug
    #[error("topic not found: {0}")]
    TopicNotFound(String),

    /// An id in a reorder request is not a current category
    #[error("unknown id in reorder request: {0}")]
    UnknownId(String),

    /// Category still owns topics
    #[error("category '{id}' still owns {} topic(s): {}", topics.len(), topics.join(", "))]
    CategoryNotEmpty {
        /// Category id
        id: String,
        /// Slugs of the owned topics
        topics: Vec<String>,
    },

    /// Topic still owns articles
    #[error("topic '{slug}' still owns {articles} article(s)")]
    TopicHasArticles {
        /// Topic slug
        slug: String,
        /// Number of owned articles
        articles: usize,
    },
}

impl SyncError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create structural error for path
    pub fn source_error(path: impl Into<PathBuf>, source: SourceError) -> Self {
        Self::Source {
            path: path.into(),
            source,
        }
    }

    /// Create data decode error for path
    pub fn data_error(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Data {
            path: path.into(),
            source,
        }
    }

    /// Source file is unreadable as the catalog schema
    #[inline]
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Source { .. } | Self::Data { .. })
    }

    /// Caller can correct the input or remove children and try again
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::CategoryNotFound(_)
                | Self::TopicNotFound(_)
                | Self::UnknownId(_)
                | Self::CategoryNotEmpty { .. }
                | Self::TopicHasArticles { .. }
                | Self::Guard(GuardError::NoBackupFound(_))
        )
    }

    /// Another writer holds a file
    #[inline]
    #[must_use]
    pub fn is_contention(&self) -> bool {
        matches!(self, Self::Guard(e) if e.is_contention())
    }
}

/// Result type for synchronizer operations
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let structural = SyncError::source_error(
            "index.ts",
            SourceError::DeclarationNotFound("topics".into()),
        );
        assert!(structural.is_structural());
        assert!(!structural.is_recoverable());

        let busy = SyncError::from(GuardError::AlreadyLocked("index.ts".into()));
        assert!(busy.is_contention());
        assert!(!busy.is_recoverable());

        let not_empty = SyncError::CategoryNotEmpty {
            id: "backend".into(),
            topics: vec!["go".into(), "rust".into()],
        };
        assert!(not_empty.is_recoverable());
        assert_eq!(
            not_empty.to_string(),
            "category 'backend' still owns 2 topic(s): go, rust"
        );

        let duplicate = SyncError::from(ValidationError::duplicate_slug("go"));
        assert!(duplicate.is_recoverable());
    }
}

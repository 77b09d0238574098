//! Structural editing errors

use thiserror::Error;

/// Failure while reading or editing a source file.
///
/// None of these are retriable: they mean the file on disk no longer has
/// the shape the catalog expects and an operator has to look at it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// File is not syntactically valid
    #[error("syntax error at {line}:{column}: {message}")]
    Parse {
        /// 1-based line
        line: usize,
        /// 1-based column
        column: usize,
        /// What the parser choked on
        message: String,
    },

    /// No exported declaration with that name
    #[error("no exported declaration named '{0}'")]
    DeclarationNotFound(String),

    /// Declaration exists but its value has the wrong literal shape
    #[error("'{name}' is not {expected}: found {found}")]
    ShapeMismatch {
        /// Declaration or field path
        name: String,
        /// Expected shape
        expected: String,
        /// What was found instead
        found: String,
    },

    /// Grammar could not be loaded into the parser
    #[error("parser initialization failed: {0}")]
    ParserInit(String),
}

impl SourceError {
    /// Create shape mismatch error
    #[inline]
    #[must_use]
    pub fn shape(
        name: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::ShapeMismatch {
            name: name.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Replace the subject name of a shape mismatch
    #[must_use]
    pub fn within(self, name: &str) -> Self {
        match self {
            Self::ShapeMismatch {
                name: inner,
                expected,
                found,
            } => Self::ShapeMismatch {
                name: if inner.is_empty() {
                    name.to_string()
                } else {
                    format!("{name}.{inner}")
                },
                expected,
                found,
            },
            other => other,
        }
    }
}

/// Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;

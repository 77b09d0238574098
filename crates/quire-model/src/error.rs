//! Validation errors

use thiserror::Error;

/// Input rejected before any write happens
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Slug does not match `^[a-z0-9-]+$`
    #[error("invalid slug '{0}': only lowercase letters, digits and '-' are allowed")]
    InvalidSlug(String),

    /// Another entity already uses this slug
    #[error("slug already in use: {0}")]
    DuplicateSlug(String),

    /// Another category already uses this title
    #[error("title already in use: {0}")]
    DuplicateTitle(String),

    /// Required field is blank
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

impl ValidationError {
    /// Create duplicate-slug error
    #[inline]
    #[must_use]
    pub fn duplicate_slug(slug: impl Into<String>) -> Self {
        Self::DuplicateSlug(slug.into())
    }

    /// Create duplicate-title error
    #[inline]
    #[must_use]
    pub fn duplicate_title(title: impl Into<String>) -> Self {
        Self::DuplicateTitle(title.into())
    }
}

/// Result type for validation
pub type ValidationResult<T> = Result<T, ValidationError>;

//! Quire catalog model
//!
//! Value types shared by every other quire crate.
//!
//! # Hierarchy
//!
//! ```text
//! Category ──items──▶ TopicRef          (category index file)
//!                       │ slug
//!                       ▼
//!                     Topic ──chapters──▶ Chapter ──articles──▶ Article
//!                     (per-topic data file)                     (document file)
//! ```
//!
//! # Core Concepts
//!
//! - [`Category`]: top-level navigation group, `id == slug`
//! - [`TopicRef`]: the index view of a topic, owned by one category
//! - [`Topic`]: the detail view stored in its own file
//! - [`renumber`]: positional id generator for chapters and articles
//! - [`validate_slug`] / [`ensure_unique_category`]: pure validation rules
//!
//! Nothing in this crate touches the filesystem.

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod catalog;
mod error;
mod ids;
mod validate;

pub use catalog::{
    Article, ArticleStatus, Category, Chapter, NewTopic, Topic, TopicRef,
};
pub use error::{ValidationError, ValidationResult};
pub use ids::{article_id, chapter_id, renumber, topic_binding};
pub use validate::{
    ensure_unique_article_slugs, ensure_unique_category, validate_slug, validate_title,
};

/// Re-export common types for convenience
pub mod prelude {
    pub use crate::catalog::{Article, ArticleStatus, Category, Chapter, NewTopic, Topic, TopicRef};
    pub use crate::error::{ValidationError, ValidationResult};
    pub use crate::ids::renumber;
    pub use crate::validate::{ensure_unique_category, validate_slug};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

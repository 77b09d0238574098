//! Quire catalog synchronizer
//!
//! Keeps the category index, per-topic data files, the topic-data index
//! and the article documents consistent when one catalog entity changes.
//!
//! # Files
//!
//! ```text
//! <root>/
//! ├── quire.toml                       optional configuration
//! ├── .vitepress/topics/config/index.ts   categories and topic references
//! ├── .vitepress/topics/data/index.ts     slug → topic map
//! ├── .vitepress/topics/data/<slug>/index.ts  one topic with chapters
//! ├── articles/<slug>/<article>.md     one document per article
//! └── .quire/backups/                  snapshots taken before each write
//! ```
//!
//! # Core Concepts
//!
//! - [`CatalogSync`]: every catalog read and mutating operation
//! - [`Synced`]: operation payload plus a [`SyncReport`] of completed and
//!   skipped steps
//! - [`CatalogConfig`] / [`CatalogPaths`]: layout, lock and watch settings
//! - [`SyncError`]: structural, recoverable and contention failures
//!
//! Operations are not atomic across files. Validation and referential
//! checks run before the first write, later failures of best-effort steps
//! are reported instead of aborting.

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod categories;
mod config;
mod documents;
mod error;
mod paths;
mod plan;
mod report;
mod sources;
mod sync;
mod topics;

pub use categories::CategoryUpdate;
pub use config::{
    resolve_root, CatalogConfig, GuardConfig, LayoutConfig, WatchConfig, CONFIG_FILE,
};
pub use documents::{parse_document, placeholder, read_documents, render_document, Document, FrontMatter};
pub use error::{SyncError, SyncResult};
pub use paths::CatalogPaths;
pub use report::{Step, StepFailure, SyncReport, Synced};
pub use sources::{CATEGORIES_EXPORT, TOPICS_DATA_EXPORT};
pub use sync::{CatalogSync, CategorySummary, TopicSummary};

/// Re-export common types for convenience
pub mod prelude {
    pub use crate::categories::CategoryUpdate;
    pub use crate::config::CatalogConfig;
    pub use crate::error::{SyncError, SyncResult};
    pub use crate::report::{SyncReport, Synced};
    pub use crate::sync::CatalogSync;
    pub use quire_model::prelude::*;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

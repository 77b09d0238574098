//! Quire change broadcaster
//!
//! Watches the catalog source directories and pushes one notification per
//! file change to every subscriber, whichever process made the change.
//!
//! ```text
//! notify callback ──try_send──▶ mpsc ──▶ event loop ──▶ broadcast ──▶ subscribers
//!                                          │
//!                                          ├── filter: hidden, backups, outsiders
//!                                          └── per-path debounce
//! ```
//!
//! # Core Concepts
//!
//! - [`CatalogWatcher`]: owns the platform watch and the event loop
//! - [`Broadcaster`]: publish/subscribe channel, also usable without a watcher
//! - [`ChangeNotification`]: `{type, path, timestamp}` with a root-relative path
//! - [`WatchFilter`]: which paths are reported

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod error;
mod events;
mod filter;
mod notification;
mod watcher;

pub use error::{WatchError, WatchResult};
pub use filter::WatchFilter;
pub use notification::{Broadcaster, ChangeKind, ChangeNotification, Subscription, DEFAULT_CAPACITY};
pub use watcher::CatalogWatcher;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Quire file guard
//!
//! Per-path advisory locks with automatic expiry, and timestamped snapshots
//! taken before every protected write.
//!
//! # Write path
//!
//! ```text
//! write(path) ──▶ acquire lock ──▶ snapshot (if present) ──▶ stage + rename ──▶ release
//!                     │
//!                     └── AlreadyLocked: caller retries or reports busy
//! ```
//!
//! # Core Concepts
//!
//! - [`LockManager`]: lock table with a fixed expiry, never blocks
//! - [`LockGuard`]: RAII handle for one held path
//! - [`BackupStore`]: `<file>.<stamp>.bak` snapshots and restore-latest
//! - [`FileGuard`]: the guarded write, remove and rename operations

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod backup;
mod error;
mod guard;
mod lock;

pub use backup::{snapshot_name, BackupStore};
pub use error::{GuardError, GuardResult};
pub use guard::FileGuard;
pub use lock::{LockGuard, LockManager, DEFAULT_LOCK_TIMEOUT};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

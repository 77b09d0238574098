//! Per-path advisory locks
//!
//! Acquisition never blocks: a held path fails with
//! [`GuardError::AlreadyLocked`] and the caller decides whether to retry.
//! Every lock expires after the manager's timeout so a crashed holder can
//! not wedge a file forever.

use crate::error::{GuardError, GuardResult};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Lock lifetime when none is configured
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
struct Holder {
    token: u64,
    expires_at: Instant,
}

/// Lock table shared by every writer of one catalog
#[derive(Debug)]
pub struct LockManager {
    held: Arc<DashMap<PathBuf, Holder>>,
    timeout: Duration,
    next_token: AtomicU64,
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

impl LockManager {
    /// Create a manager whose locks expire after `timeout`
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            held: Arc::new(DashMap::new()),
            timeout,
            next_token: AtomicU64::new(1),
        }
    }

    /// Configured expiry
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Take the lock on `path`.
    ///
    /// Expiry is scheduled on the current Tokio runtime when one exists and
    /// is also checked here, so an expired holder never blocks a new one.
    ///
    /// # Errors
    /// Returns [`GuardError::AlreadyLocked`] while another holder's lock is live.
    pub fn acquire(&self, path: &Path) -> GuardResult<LockGuard> {
        let now = Instant::now();
        let holder = Holder {
            token: self.next_token.fetch_add(1, Ordering::Relaxed),
            expires_at: now + self.timeout,
        };

        match self.held.entry(path.to_path_buf()) {
            Entry::Occupied(mut slot) => {
                if slot.get().expires_at > now {
                    return Err(GuardError::AlreadyLocked(path.to_path_buf()));
                }
                debug!("taking over expired lock on {}", path.display());
                slot.insert(holder);
            }
            Entry::Vacant(slot) => {
                slot.insert(holder);
            }
        }
        debug!("locked {}", path.display());

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let held = Arc::clone(&self.held);
            let key = path.to_path_buf();
            runtime.spawn(async move {
                tokio::time::sleep_until(holder.expires_at).await;
                if held.remove_if(&key, |_, h| h.token == holder.token).is_some() {
                    debug!("lock on {} expired", key.display());
                }
            });
        }

        Ok(LockGuard {
            held: Arc::clone(&self.held),
            path: path.to_path_buf(),
            token: holder.token,
        })
    }

    /// Clear the lock on `path` whoever holds it. Releasing a free path is a no-op.
    pub fn release(&self, path: &Path) {
        if self.held.remove(path).is_some() {
            debug!("released {}", path.display());
        }
    }

    /// Whether `path` is currently locked
    #[must_use]
    pub fn is_locked(&self, path: &Path) -> bool {
        self.held
            .get(path)
            .is_some_and(|h| h.expires_at > Instant::now())
    }

    /// Number of live locks
    #[must_use]
    pub fn held_count(&self) -> usize {
        let now = Instant::now();
        self.held.iter().filter(|h| h.expires_at > now).count()
    }
}

/// Held lock, released on drop.
///
/// Only the lock this guard took is released: if it expired and another
/// writer took the path over, dropping the stale guard leaves theirs alone.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    held: Arc<DashMap<PathBuf, Holder>>,
    path: PathBuf,
    token: u64,
}

impl LockGuard {
    /// Locked path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release now
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let token = self.token;
        if self.held.remove_if(&self.path, |_, h| h.token == token).is_some() {
            debug!("released {}", self.path.display());
        }
    }
}

//! Platform watcher bridged into the broadcaster

use crate::error::{WatchError, WatchResult};
use crate::events::{classify, Known, Pending};
use crate::filter::WatchFilter;
use crate::notification::{Broadcaster, ChangeKind, ChangeNotification, Subscription};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use quire_sync::{CatalogPaths, WatchConfig};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Capacity of the channel between the platform callback and the event loop
const CHANNEL_CAPACITY: usize = 512;

/// Watches the catalog source directories and broadcasts file changes.
///
/// Dropping the watcher deregisters the platform watch and stops the event
/// loop. Directories missing at start are not watched.
pub struct CatalogWatcher {
    broadcaster: Broadcaster,
    watched: Vec<PathBuf>,
    task: JoinHandle<()>,
    // must stay alive, dropping it stops event delivery
    _watcher: RecommendedWatcher,
}

impl CatalogWatcher {
    /// Start watching with a fresh broadcaster. Must be called within a
    /// tokio runtime.
    ///
    /// # Errors
    /// Returns [`WatchError::Io`] if the root cannot be resolved and
    /// [`WatchError::Create`] if the platform watcher fails.
    pub fn start(paths: &CatalogPaths, config: &WatchConfig) -> WatchResult<Self> {
        Self::with_broadcaster(paths, config, Broadcaster::default())
    }

    /// Start watching and publish into an existing broadcaster
    ///
    /// # Errors
    /// See [`CatalogWatcher::start`].
    pub fn with_broadcaster(
        paths: &CatalogPaths,
        config: &WatchConfig,
        broadcaster: Broadcaster,
    ) -> WatchResult<Self> {
        // platform events carry canonical paths
        let root = std::fs::canonicalize(paths.root())
            .map_err(|e| WatchError::io_error(paths.root(), e))?;
        let filter = WatchFilter::for_catalog(paths, &root);

        let (tx, rx) = mpsc::channel::<notify::Event>(CHANNEL_CAPACITY);
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    if tx.try_send(event).is_err() {
                        warn!("watch channel full, dropping event");
                    }
                }
                Err(e) => warn!("filesystem watcher error: {}", e),
            },
            notify::Config::default(),
        )
        .map_err(WatchError::Create)?;

        let mut watched = Vec::new();
        for dir in filter.watched() {
            if !dir.is_dir() {
                warn!("not watching missing directory {}", dir.display());
                continue;
            }
            watcher
                .watch(dir, RecursiveMode::Recursive)
                .map_err(|source| WatchError::Watch {
                    path: dir.clone(),
                    source,
                })?;
            watched.push(dir.clone());
        }

        let known = Known::new(filter.scan());
        let task = tokio::spawn(run_event_loop(
            rx,
            filter,
            known,
            config.debounce(),
            broadcaster.clone(),
        ));
        info!("watching {} directories under {}", watched.len(), root.display());

        Ok(Self {
            broadcaster,
            watched,
            task,
            _watcher: watcher,
        })
    }

    /// Channel the watcher publishes into
    #[inline]
    #[must_use]
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// New listener for file changes
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.broadcaster.subscribe()
    }

    /// Directories registered with the platform watcher
    #[inline]
    #[must_use]
    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }
}

impl Drop for CatalogWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_event_loop(
    mut rx: mpsc::Receiver<notify::Event>,
    filter: WatchFilter,
    mut known: Known,
    window: Duration,
    broadcaster: Broadcaster,
) {
    let emit = |changes: Vec<(String, ChangeKind)>| {
        for (path, kind) in changes {
            broadcaster.publish(ChangeNotification::new(kind, path));
        }
    };
    let mut pending = Pending::default();

    loop {
        let received = match pending.next_deadline() {
            Some(deadline) => tokio::select! {
                event = rx.recv() => event,
                () = tokio::time::sleep_until(deadline) => {
                    emit(pending.take_ready(Instant::now()));
                    continue;
                }
            },
            None => rx.recv().await,
        };
        let Some(event) = received else {
            // watcher dropped
            emit(pending.drain());
            break;
        };

        for (path, kind) in classify(&event) {
            let Some(relative) = filter.relative(&path) else {
                continue;
            };
            let kind = known.observe(&relative, kind);
            if window.is_zero() {
                emit(vec![(relative, kind)]);
            } else {
                pending.push(relative, kind, Instant::now() + window);
            }
        }
        if !window.is_zero() {
            debug!("{} changes pending", pending.len());
        }
    }
    debug!("watch event loop stopped");
}

//! Platform events to change kinds, and per-path debouncing

use crate::notification::ChangeKind;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tokio::time::Instant;

/// File-level changes carried by one platform event
pub(crate) fn classify(event: &Event) -> Vec<(PathBuf, ChangeKind)> {
    let each = |kind: ChangeKind| -> Vec<(PathBuf, ChangeKind)> {
        event.paths.iter().map(|p| (p.clone(), kind)).collect()
    };
    match &event.kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => Vec::new(),
        EventKind::Create(_) => each(ChangeKind::Add),
        EventKind::Remove(_) => each(ChangeKind::Unlink),
        EventKind::Modify(ModifyKind::Name(mode)) => match (mode, event.paths.as_slice()) {
            (RenameMode::Both, [from, to]) => {
                let mut changes = vec![(from.clone(), ChangeKind::Unlink)];
                if !to.is_dir() {
                    changes.push((to.clone(), ChangeKind::Add));
                }
                changes
            }
            (RenameMode::From, _) => each(ChangeKind::Unlink),
            (RenameMode::To, _) => event
                .paths
                .iter()
                .filter(|p| !p.is_dir())
                .map(|p| (p.clone(), ChangeKind::Add))
                .collect(),
            // the platform did not say which side this is
            _ => event
                .paths
                .iter()
                .filter(|p| !p.is_dir())
                .map(|p| {
                    let kind = if p.exists() {
                        ChangeKind::Add
                    } else {
                        ChangeKind::Unlink
                    };
                    (p.clone(), kind)
                })
                .collect(),
        },
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => each(ChangeKind::Change),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Files known to exist, so an overwrite by rename reads as a change
#[derive(Debug, Default)]
pub(crate) struct Known {
    files: HashSet<String>,
}

impl Known {
    pub(crate) fn new(files: HashSet<String>) -> Self {
        Self { files }
    }

    pub(crate) fn observe(&mut self, path: &str, kind: ChangeKind) -> ChangeKind {
        match kind {
            ChangeKind::Add if !self.files.insert(path.to_string()) => ChangeKind::Change,
            ChangeKind::Unlink => {
                self.files.remove(path);
                kind
            }
            ChangeKind::Add | ChangeKind::Change => {
                self.files.insert(path.to_string());
                kind
            }
        }
    }
}

/// Changes waiting out their debounce window
#[derive(Debug, Default)]
pub(crate) struct Pending {
    entries: HashMap<String, (ChangeKind, Instant)>,
}

impl Pending {
    /// Record a change; a later change to the same path restarts its window
    pub(crate) fn push(&mut self, path: String, kind: ChangeKind, deadline: Instant) {
        match self.entries.remove(&path) {
            Some((earlier, _)) => {
                if let Some(merged) = earlier.merge(kind) {
                    self.entries.insert(path, (merged, deadline));
                }
            }
            None => {
                self.entries.insert(path, (kind, deadline));
            }
        }
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.entries.values().map(|(_, deadline)| *deadline).min()
    }

    /// Remove and return every change whose window has passed, by path
    pub(crate) fn take_ready(&mut self, now: Instant) -> Vec<(String, ChangeKind)> {
        let mut ready: Vec<(String, ChangeKind)> = self
            .entries
            .iter()
            .filter(|(_, (_, deadline))| *deadline <= now)
            .map(|(path, (kind, _))| (path.clone(), *kind))
            .collect();
        for (path, _) in &ready {
            self.entries.remove(path);
        }
        ready.sort_by(|a, b| a.0.cmp(&b.0));
        ready
    }

    pub(crate) fn drain(&mut self) -> Vec<(String, ChangeKind)> {
        let mut all: Vec<_> = self
            .entries
            .drain()
            .map(|(path, (kind, _))| (path, kind))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::DataChange;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |e, p| e.add_path(PathBuf::from(p)))
    }

    #[test]
    fn maps_platform_events() {
        let created = event(EventKind::Create(CreateKind::File), &["/s/a.md"]);
        assert_eq!(classify(&created), vec![(PathBuf::from("/s/a.md"), ChangeKind::Add)]);

        let written = event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), &["/s/a.md"]);
        assert_eq!(classify(&written), vec![(PathBuf::from("/s/a.md"), ChangeKind::Change)]);

        let removed = event(EventKind::Remove(RemoveKind::File), &["/s/a.md"]);
        assert_eq!(classify(&removed), vec![(PathBuf::from("/s/a.md"), ChangeKind::Unlink)]);

        let folder = event(EventKind::Create(CreateKind::Folder), &["/s/go"]);
        assert!(classify(&folder).is_empty());
    }

    #[test]
    fn rename_is_unlink_then_add() {
        let renamed = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/nonexistent/old.md", "/nonexistent/new.md"],
        );
        assert_eq!(
            classify(&renamed),
            vec![
                (PathBuf::from("/nonexistent/old.md"), ChangeKind::Unlink),
                (PathBuf::from("/nonexistent/new.md"), ChangeKind::Add),
            ]
        );
    }

    #[test]
    fn known_files_turn_add_into_change() {
        let mut known = Known::new(HashSet::from(["a.md".to_string()]));
        assert_eq!(known.observe("a.md", ChangeKind::Add), ChangeKind::Change);
        assert_eq!(known.observe("b.md", ChangeKind::Add), ChangeKind::Add);
        assert_eq!(known.observe("a.md", ChangeKind::Unlink), ChangeKind::Unlink);
        assert_eq!(known.observe("a.md", ChangeKind::Add), ChangeKind::Add);
    }

    #[test]
    fn debounce_coalesces_per_path() {
        let start = Instant::now();
        let window = Duration::from_millis(300);
        let mut pending = Pending::default();

        pending.push("a.md".into(), ChangeKind::Add, start + window);
        pending.push("a.md".into(), ChangeKind::Change, start + window * 2);
        pending.push("b.md".into(), ChangeKind::Change, start + window);
        assert_eq!(pending.len(), 2);
        assert_eq!(pending.next_deadline(), Some(start + window));

        assert_eq!(pending.take_ready(start + window), vec![("b.md".to_string(), ChangeKind::Change)]);
        assert_eq!(pending.take_ready(start + window * 2), vec![("a.md".to_string(), ChangeKind::Add)]);
        assert_eq!(pending.len(), 0);
    }

    #[test]
    fn add_then_unlink_cancels() {
        let deadline = Instant::now();
        let mut pending = Pending::default();
        pending.push("tmp.md".into(), ChangeKind::Add, deadline);
        pending.push("tmp.md".into(), ChangeKind::Unlink, deadline);
        assert!(pending.drain().is_empty());
    }
}

//! Change notifications and the publish/subscribe channel

use crate::error::WatchResult;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tracing::debug;

/// Default number of notifications buffered per subscriber
pub const DEFAULT_CAPACITY: usize = 256;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// File appeared
    Add,
    /// File content changed
    Change,
    /// File disappeared
    Unlink,
}

impl ChangeKind {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Change => "change",
            Self::Unlink => "unlink",
        }
    }

    /// Fold a later event for the same path into an earlier one.
    /// `None` means the two cancel out.
    #[must_use]
    pub fn merge(self, later: Self) -> Option<Self> {
        match (self, later) {
            (Self::Add, Self::Change | Self::Add) => Some(Self::Add),
            (Self::Add, Self::Unlink) => None,
            (Self::Unlink, Self::Add | Self::Change) => Some(Self::Change),
            (_, later) => Some(later),
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file change, as pushed to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    /// Kind of change
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// Path relative to the catalog root, `/`-separated
    pub path: String,
    /// RFC 3339 UTC time with milliseconds
    pub timestamp: String,
}

impl ChangeNotification {
    /// Notification stamped with the current time
    pub fn new(kind: ChangeKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Single-line JSON form
    ///
    /// # Errors
    /// Returns [`crate::WatchError::Encode`] if serialization fails.
    pub fn to_json(&self) -> WatchResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Fan-out of notifications to every live subscriber.
///
/// Cloning shares the channel. Subscribers join and leave at any time and a
/// dropped subscriber simply stops counting.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    sender: broadcast::Sender<ChangeNotification>,
}

impl Broadcaster {
    /// Channel buffering up to `capacity` notifications per subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Push a notification to every subscriber, returning how many got it
    pub fn publish(&self, notification: ChangeNotification) -> usize {
        debug!("broadcast {} {}", notification.kind, notification.path);
        // no subscribers is not an error
        self.sender.send(notification).unwrap_or(0)
    }

    /// Start receiving notifications published from now on
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscribers
    #[inline]
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Receiving end for one listener
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<ChangeNotification>,
}

impl Subscription {
    /// Next notification, or `None` once every sender is gone.
    ///
    /// A subscriber that fell behind skips what it missed.
    pub async fn recv(&mut self) -> Option<ChangeNotification> {
        loop {
            match self.receiver.recv().await {
                Ok(notification) => return Some(notification),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    debug!("subscriber lagged, skipped {} notifications", missed);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_with_type_field() {
        let notification = ChangeNotification {
            kind: ChangeKind::Unlink,
            path: "articles/go/intro.md".into(),
            timestamp: "2024-03-05T10:20:30.123Z".into(),
        };
        assert_eq!(
            notification.to_json().unwrap(),
            r#"{"type":"unlink","path":"articles/go/intro.md","timestamp":"2024-03-05T10:20:30.123Z"}"#
        );
    }

    #[test]
    fn timestamp_has_millis_and_z() {
        let notification = ChangeNotification::new(ChangeKind::Add, "a.md");
        let stamp = &notification.timestamp;
        assert!(stamp.ends_with('Z'));
        assert_eq!(stamp.len(), "2024-03-05T10:20:30.123Z".len());
    }

    #[test]
    fn merge_rules() {
        use ChangeKind::{Add, Change, Unlink};
        assert_eq!(Add.merge(Change), Some(Add));
        assert_eq!(Add.merge(Unlink), None);
        assert_eq!(Change.merge(Unlink), Some(Unlink));
        assert_eq!(Unlink.merge(Add), Some(Change));
        assert_eq!(Change.merge(Change), Some(Change));
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let broadcaster = Broadcaster::new(8);
        assert_eq!(broadcaster.publish(ChangeNotification::new(ChangeKind::Add, "x")), 0);

        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 2);

        assert_eq!(broadcaster.publish(ChangeNotification::new(ChangeKind::Change, "a.md")), 2);
        assert_eq!(first.recv().await.unwrap().path, "a.md");
        assert_eq!(second.recv().await.unwrap().kind, ChangeKind::Change);

        drop(second);
        assert_eq!(broadcaster.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn lagging_subscriber_keeps_receiving() {
        let broadcaster = Broadcaster::new(2);
        let mut slow = broadcaster.subscribe();
        for path in ["1", "2", "3", "4"] {
            broadcaster.publish(ChangeNotification::new(ChangeKind::Change, path));
        }

        assert_eq!(slow.recv().await.unwrap().path, "3");
        assert_eq!(slow.recv().await.unwrap().path, "4");
    }

    #[tokio::test]
    async fn closed_channel_ends_subscription() {
        let broadcaster = Broadcaster::new(4);
        let mut subscription = broadcaster.subscribe();
        drop(broadcaster);
        assert!(subscription.recv().await.is_none());
    }
}

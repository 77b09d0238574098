//! Step reports for multi-file operations
//!
//! A catalog operation is an ordered list of steps over separate files.
//! Required steps abort the operation on failure. Best-effort steps are
//! logged, recorded as skipped and the operation continues.

use crate::error::SyncResult;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use std::future::Future;
use tracing::{debug, warn};

/// A step that ran to completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// What the step does
    pub step: String,
    /// File, directory or entity it touched
    pub target: String,
}

/// A best-effort step that did not complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    /// What the step does
    pub step: String,
    /// File, directory or entity it was meant to touch
    pub target: String,
    /// Why it was skipped
    pub error: String,
}

impl Display for StepFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.step, self.target, self.error)
    }
}

/// Completed and skipped steps of one operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Steps that ran, in order
    pub completed: Vec<Step>,
    /// Best-effort steps that were skipped
    pub skipped: Vec<StepFailure>,
}

impl SyncReport {
    /// Whether every step completed
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Operation payload with its step report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Synced<T> {
    /// Operation result
    pub value: T,
    /// What happened on the way
    pub report: SyncReport,
}

impl<T> Synced<T> {
    /// Drop the report
    #[inline]
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Ordered step runner for one operation
#[derive(Debug)]
pub(crate) struct Saga {
    operation: &'static str,
    report: SyncReport,
}

impl Saga {
    pub(crate) fn new(operation: &'static str) -> Self {
        debug!("{}: starting", operation);
        Self {
            operation,
            report: SyncReport::default(),
        }
    }

    /// Record a completed step that ran outside the runner
    pub(crate) fn record(&mut self, step: &str, target: impl Display) {
        debug!("{}: {} ({})", self.operation, step, target);
        self.report.completed.push(Step {
            step: step.to_string(),
            target: target.to_string(),
        });
    }

    /// Run a step whose failure aborts the operation
    pub(crate) async fn required<T>(
        &mut self,
        step: &str,
        target: impl Display,
        work: impl Future<Output = SyncResult<T>>,
    ) -> SyncResult<T> {
        let value = work.await?;
        self.record(step, target);
        Ok(value)
    }

    /// Run a step whose failure is recorded and skipped
    pub(crate) async fn best_effort<T>(
        &mut self,
        step: &str,
        target: impl Display,
        work: impl Future<Output = SyncResult<T>>,
    ) -> Option<T> {
        match work.await {
            Ok(value) => {
                self.record(step, target);
                Some(value)
            }
            Err(e) => {
                self.skip(step, target, e);
                None
            }
        }
    }

    /// Record a step that was not attempted or failed outside [`Saga::best_effort`]
    pub(crate) fn skip(&mut self, step: &str, target: impl Display, reason: impl Display) {
        let failure = StepFailure {
            step: step.to_string(),
            target: target.to_string(),
            error: reason.to_string(),
        };
        warn!("{}: skipped {}", self.operation, failure);
        self.report.skipped.push(failure);
    }

    pub(crate) fn finish<T>(self, value: T) -> Synced<T> {
        debug!(
            "{}: finished, {} step(s) completed, {} skipped",
            self.operation,
            self.report.completed.len(),
            self.report.skipped.len()
        );
        Synced {
            value,
            report: self.report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn best_effort_failures_are_collected() {
        let mut saga = Saga::new("test");
        saga.required("first", "a", async { Ok(()) }).await.unwrap();
        let skipped = saga
            .best_effort("second", "b", async {
                Err::<(), _>(SyncError::TopicNotFound("b".into()))
            })
            .await;
        assert!(skipped.is_none());
        saga.best_effort("third", "c", async { Ok(3) }).await;

        let synced = saga.finish("done");
        assert_eq!(synced.value, "done");
        let names: Vec<_> = synced.report.completed.iter().map(|s| s.step.as_str()).collect();
        assert_eq!(names, vec!["first", "third"]);
        assert_eq!(synced.report.skipped.len(), 1);
        assert_eq!(synced.report.skipped[0].to_string(), "second (b): topic not found: b");
        assert!(!synced.report.is_clean());
    }

    #[tokio::test]
    async fn required_failure_propagates() {
        let mut saga = Saga::new("test");
        let err = saga
            .required("first", "a", async { Err::<(), _>(SyncError::UnknownId("x".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::UnknownId(_)));
        assert!(saga.finish(()).report.completed.is_empty());
    }
}

//! Boundaries to everything outside the watcher: the job scheduler, the
//! watched directory, and the notification side effects.

use std::path::Path;

use async_trait::async_trait;

use crate::artifact::ArtifactState;
use crate::pattern::FilePattern;
use crate::types::{ExecutionStatus, HistoryRecord, InstanceId, RunResult};

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Faults raised by a scheduler adapter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulerError {
    /// The service account may not read the object. Callers that can degrade
    /// (fuzzy matching, baselines, status queries) do so on this variant.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),
}

impl SchedulerError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}

/// Administrative view of a remote job scheduler.
///
/// Methods take `&mut self` because one connection is held for the whole
/// invocation and queries on it are strictly sequential.
#[async_trait]
pub trait JobScheduler: Send {
    /// Job names matching a SQL `LIKE` pattern, ordered by name.
    async fn find_jobs(&mut self, like_pattern: &str) -> Result<Vec<String>, SchedulerError>;

    /// Name of the step with `step_id` in `job`, if it exists.
    async fn step_name(&mut self, job: &str, step_id: i32)
        -> Result<Option<String>, SchedulerError>;

    async fn has_step(&mut self, job: &str, step_name: &str) -> Result<bool, SchedulerError>;

    /// Largest whole-job history instance id, `0` when the job never ran.
    async fn max_history_instance(&mut self, job: &str) -> Result<InstanceId, SchedulerError>;

    async fn start_job(&mut self, job: &str, step_name: Option<&str>)
        -> Result<(), SchedulerError>;

    /// Whether the current execution status of jobs can be read at all.
    ///
    /// Called once per invocation; the answer is not re-probed while polling.
    async fn supports_status_query(&mut self) -> bool;

    /// `None` when the scheduler returned no status for the job.
    async fn execution_status(
        &mut self,
        job: &str,
    ) -> Result<Option<ExecutionStatus>, SchedulerError>;

    /// Newest whole-job history row.
    async fn latest_history(&mut self, job: &str) -> Result<Option<HistoryRecord>, SchedulerError>;
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// Produces [`ArtifactState`] snapshots of a directory.
///
/// Implementations must return an [`std::io::ErrorKind::NotFound`] error when
/// `dir` does not exist or is not a directory.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn snapshot(&self, dir: &Path, pattern: &FilePattern)
        -> std::io::Result<ArtifactState>;
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
    TimedOut,
}

/// What a notifier is told once a wait has ended.
#[derive(Debug, Clone, Copy)]
pub struct Notification<'a> {
    pub outcome: Outcome,
    pub result: &'a RunResult,
    /// Directory configured for the run, opened on success when it exists.
    pub archive_dir: Option<&'a Path>,
}

/// Side effects fired after a wait ends.
///
/// Implementations swallow (and log) their own failures: a notification can
/// never change the outcome reported to the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification<'_>);
}

/// Notifier that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _notification: &Notification<'_>) {}
}

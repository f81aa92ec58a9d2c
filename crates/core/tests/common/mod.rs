//! In-memory fakes shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use jobwatch_core::artifact::ArtifactState;
use jobwatch_core::pattern::FilePattern;
use jobwatch_core::ports::{
    ArtifactSource, JobScheduler, Notification, Notifier, Outcome, SchedulerError,
};
use jobwatch_core::types::{ArtifactFile, ExecutionStatus, HistoryRecord, InstanceId};

// ---------------------------------------------------------------------------
// FakeScheduler
// ---------------------------------------------------------------------------

/// Scriptable scheduler.
///
/// `statuses` and `history` are consumed one entry per call; once exhausted
/// the last entry keeps being returned.
#[derive(Debug, Default)]
pub struct FakeScheduler {
    pub jobs: Vec<String>,
    /// `(job, step_id, step_name)`
    pub steps: Vec<(String, i32, String)>,
    pub catalog_denied: bool,
    pub history_denied: bool,
    pub status_supported: bool,
    pub max_instance: InstanceId,
    pub statuses: Vec<Result<Option<ExecutionStatus>, SchedulerError>>,
    pub history: Vec<Result<Option<HistoryRecord>, SchedulerError>>,
    pub start_error: Option<SchedulerError>,

    pub started: Vec<(String, Option<String>)>,
    pub status_calls: usize,
    pub history_calls: usize,
}

impl FakeScheduler {
    pub fn with_jobs(jobs: &[&str]) -> Self {
        Self {
            jobs: jobs.iter().map(|j| j.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn step(mut self, job: &str, id: i32, name: &str) -> Self {
        self.steps.push((job.to_string(), id, name.to_string()));
        self
    }
}

fn scripted<T: Clone>(script: &[T], call: usize) -> Option<T> {
    script.get(call).or_else(|| script.last()).cloned()
}

/// SQL `LIKE` with `%` and `_`, no escapes.
fn like_match(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('%', rest)) => (0..=text.len()).any(|i| like_match(rest, &text[i..])),
        Some(('_', rest)) => !text.is_empty() && like_match(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && like_match(rest, &text[1..]),
    }
}

fn denied(what: &str) -> SchedulerError {
    SchedulerError::PermissionDenied(format!("SELECT permission was denied on {what}"))
}

#[async_trait]
impl JobScheduler for FakeScheduler {
    async fn find_jobs(&mut self, like_pattern: &str) -> Result<Vec<String>, SchedulerError> {
        if self.catalog_denied {
            return Err(denied("sysjobs"));
        }
        let pattern: Vec<char> = like_pattern.chars().collect();
        let mut found: Vec<String> = self
            .jobs
            .iter()
            .filter(|job| like_match(&pattern, &job.chars().collect::<Vec<_>>()))
            .cloned()
            .collect();
        found.sort();
        Ok(found)
    }

    async fn step_name(
        &mut self,
        job: &str,
        step_id: i32,
    ) -> Result<Option<String>, SchedulerError> {
        Ok(self
            .steps
            .iter()
            .find(|(j, id, _)| j == job && *id == step_id)
            .map(|(_, _, name)| name.clone()))
    }

    async fn has_step(&mut self, job: &str, step_name: &str) -> Result<bool, SchedulerError> {
        Ok(self.steps.iter().any(|(j, _, name)| j == job && name == step_name))
    }

    async fn max_history_instance(&mut self, _job: &str) -> Result<InstanceId, SchedulerError> {
        if self.history_denied {
            return Err(denied("sysjobhistory"));
        }
        Ok(self.max_instance)
    }

    async fn start_job(
        &mut self,
        job: &str,
        step_name: Option<&str>,
    ) -> Result<(), SchedulerError> {
        if let Some(err) = self.start_error.clone() {
            return Err(err);
        }
        self.started
            .push((job.to_string(), step_name.map(str::to_string)));
        Ok(())
    }

    async fn supports_status_query(&mut self) -> bool {
        self.status_supported
    }

    async fn execution_status(
        &mut self,
        _job: &str,
    ) -> Result<Option<ExecutionStatus>, SchedulerError> {
        let call = self.status_calls;
        self.status_calls += 1;
        scripted(&self.statuses, call).unwrap_or(Ok(None))
    }

    async fn latest_history(
        &mut self,
        _job: &str,
    ) -> Result<Option<HistoryRecord>, SchedulerError> {
        let call = self.history_calls;
        self.history_calls += 1;
        scripted(&self.history, call).unwrap_or(Ok(None))
    }
}

pub fn history(instance_id: InstanceId, run_status: i32, message: &str) -> HistoryRecord {
    HistoryRecord {
        instance_id,
        run_status,
        message: message.to_string(),
        run_date: Some(20240315),
        run_time: Some(73005),
        run_duration: Some(125),
    }
}

// ---------------------------------------------------------------------------
// ScriptedArtifacts
// ---------------------------------------------------------------------------

/// Artifact source returning a fixed sequence of snapshots.
///
/// Call 0 is normally the pre-start baseline; call N is poll tick N.
#[derive(Debug, Default)]
pub struct ScriptedArtifacts {
    pub snapshots: Vec<std::io::Result<ArtifactState>>,
    pub calls: Mutex<usize>,
}

impl ScriptedArtifacts {
    pub fn new(snapshots: Vec<ArtifactState>) -> Self {
        Self {
            snapshots: snapshots.into_iter().map(Ok).collect(),
            calls: Mutex::new(0),
        }
    }

    pub fn missing_directory() -> Self {
        Self {
            snapshots: vec![Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such directory",
            ))],
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().expect("lock")
    }
}

#[async_trait]
impl ArtifactSource for ScriptedArtifacts {
    async fn snapshot(
        &self,
        _dir: &Path,
        _pattern: &FilePattern,
    ) -> std::io::Result<ArtifactState> {
        let mut calls = self.calls.lock().expect("lock");
        let call = *calls;
        *calls += 1;
        let idx = call.min(self.snapshots.len().saturating_sub(1));
        match self.snapshots.get(idx) {
            Some(Ok(state)) => Ok(state.clone()),
            Some(Err(e)) => Err(std::io::Error::new(e.kind(), e.to_string())),
            None => Ok(ArtifactState::default()),
        }
    }
}

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("valid timestamp")
}

pub fn snapshot(files: &[(&str, i64)]) -> ArtifactState {
    let mut state = ArtifactState::default();
    for (name, secs) in files {
        state.observe(ArtifactFile {
            path: PathBuf::from("/archive").join(name),
            modified: at(*secs),
        });
    }
    state
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub seen: Mutex<Vec<(Outcome, Option<PathBuf>)>>,
}

impl RecordingNotifier {
    pub fn outcomes(&self) -> Vec<Outcome> {
        self.seen
            .lock()
            .expect("lock")
            .iter()
            .map(|(o, _)| *o)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification<'_>) {
        self.seen.lock().expect("lock").push((
            notification.outcome,
            notification.archive_dir.map(Path::to_path_buf),
        ));
    }
}

//! Start-and-wait orchestration.
//!
//! [`JobRunner::run`] performs, in order: request validation, job/step
//! resolution, baseline snapshots, the start call, completion detection and
//! notification. Everything that can fail on caller input fails before the
//! start call is issued.

use std::path::Path;

use uuid::Uuid;

use crate::artifact::ArtifactState;
use crate::baseline;
use crate::clock::Clock;
use crate::detector::{Completion, CompletionDetector, Detected, TimedOut};
use crate::error::WatchError;
use crate::ports::{ArtifactSource, JobScheduler, Notification, Notifier, Outcome};
use crate::request::WatchRequest;
use crate::resolver;
use crate::status::run_status_label;
use crate::types::{DetectionMode, HistoryBaseline, JobHandle, RunResult};

/// Everything known about a run before the job is started.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub run_id: Uuid,
    pub job: JobHandle,
    pub history_baseline: HistoryBaseline,
    /// Present when the request watches an artifact directory.
    pub artifact_baseline: Option<ArtifactState>,
}

pub struct JobRunner<S, A, C, N> {
    scheduler: S,
    artifacts: A,
    clock: C,
    notifier: N,
}

impl<S, A, C, N> JobRunner<S, A, C, N>
where
    S: JobScheduler,
    A: ArtifactSource,
    C: Clock,
    N: Notifier,
{
    pub fn new(scheduler: S, artifacts: A, clock: C, notifier: N) -> Self {
        Self {
            scheduler,
            artifacts,
            clock,
            notifier,
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn artifacts(&self) -> &A {
        &self.artifacts
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Resolve and snapshot without starting anything.
    pub async fn prepare(&mut self, request: &WatchRequest) -> Result<PreparedRun, WatchError> {
        request.validate()?;

        let job = resolver::resolve(
            &mut self.scheduler,
            request.job_name.trim(),
            request.fuzzy,
            request.start_step.as_ref(),
        )
        .await?;

        let artifact_baseline = match &request.artifact {
            Some(watch) => {
                let state = self
                    .artifacts
                    .snapshot(&watch.dir, &watch.pattern)
                    .await
                    .map_err(|e| match e.kind() {
                        std::io::ErrorKind::NotFound => {
                            WatchError::DirectoryNotFound(watch.dir.clone())
                        }
                        _ => WatchError::Artifact(e),
                    })?;
                tracing::debug!(
                    dir = %watch.dir.display(),
                    pattern = %watch.pattern,
                    matched = state.matched,
                    "Artifact baseline captured",
                );
                Some(state)
            }
            None => None,
        };

        let history_baseline = baseline::capture(&mut self.scheduler, job.name()).await;

        Ok(PreparedRun {
            run_id: Uuid::new_v4(),
            job,
            history_baseline,
            artifact_baseline,
        })
    }

    /// Start the prepared job and wait for it to finish.
    pub async fn execute(
        &mut self,
        request: &WatchRequest,
        prepared: PreparedRun,
    ) -> Result<RunResult, WatchError> {
        let PreparedRun {
            run_id,
            job,
            history_baseline,
            artifact_baseline,
        } = prepared;

        match job.step() {
            Some(step) => tracing::info!(%run_id, job = %job.name(), step = %step, "Starting SQL Agent job"),
            None => tracing::info!(%run_id, job = %job.name(), "Starting SQL Agent job"),
        }

        let started_at = self.clock.now();
        self.scheduler.start_job(job.name(), job.step()).await?;

        let mut detector =
            CompletionDetector::new(&self.clock, request.timeout, request.poll_interval);

        let (mode, detected) = match (&request.artifact, &artifact_baseline) {
            (Some(watch), Some(baseline)) => {
                tracing::info!(%run_id, dir = %watch.dir.display(), policy = ?watch.policy, "Watching artifact directory");
                let detected = detector
                    .watch_artifacts(&self.artifacts, watch, baseline)
                    .await;
                (DetectionMode::FileWatch, detected)
            }
            _ => {
                let has_status_query = self.scheduler.supports_status_query().await;
                if !has_status_query {
                    tracing::info!(%run_id, "Execution status unavailable, polling run history only");
                }
                let detected = detector
                    .watch_scheduler(
                        &mut self.scheduler,
                        job.name(),
                        history_baseline,
                        has_status_query,
                    )
                    .await;
                (DetectionMode::SchedulerStatus, detected)
            }
        };

        let mut result = RunResult {
            run_id,
            job: job.name().to_string(),
            step: job.step().map(str::to_string),
            success: false,
            mode,
            started_at,
            finished_at: self.clock.now(),
            polls: 0,
            message: String::new(),
            status_code: None,
            run_started_at: None,
            run_duration_secs: None,
            artifact: None,
        };

        let archive_dir = request.artifact.as_ref().map(|w| w.dir.as_path());

        match detected {
            Ok(Detected {
                completion: Completion::History(record),
                ticks,
            }) => {
                result.polls = ticks;
                result.success = record.succeeded();
                result.status_code = Some(record.run_status);
                result.run_started_at = record.started_at();
                result.run_duration_secs = record.duration().map(|d| d.as_secs());
                result.message = if record.message.trim().is_empty() {
                    format!("Job {}", run_status_label(record.run_status))
                } else {
                    record.message.clone()
                };

                if result.success {
                    tracing::info!(%run_id, job = %result.job, polls = ticks, "Job succeeded");
                    self.notify(Outcome::Succeeded, &result, archive_dir).await;
                    Ok(result)
                } else {
                    tracing::warn!(
                        %run_id,
                        job = %result.job,
                        run_status = record.run_status,
                        message = %result.message,
                        "Job failed",
                    );
                    self.notify(Outcome::Failed, &result, archive_dir).await;
                    Err(WatchError::JobFailed {
                        job: result.job.clone(),
                        status_code: record.run_status,
                        message: result.message.clone(),
                        result: Box::new(result),
                    })
                }
            }
            Ok(Detected {
                completion: Completion::Artifact(state),
                ticks,
            }) => {
                result.polls = ticks;
                result.success = true;
                result.message = match &state.newest {
                    Some(file) => format!("{} updated", display_name(&file.path)),
                    None => "Artifact directory updated".to_string(),
                };
                result.artifact = state.newest;
                tracing::info!(%run_id, job = %result.job, polls = ticks, message = %result.message, "Artifact detected");
                self.notify(Outcome::Succeeded, &result, archive_dir).await;
                Ok(result)
            }
            Err(TimedOut { ticks, waited }) => {
                result.polls = ticks;
                result.mode = DetectionMode::TimeoutFallback;
                result.message = format!(
                    "No completion signal from {mode} within {}s",
                    waited.as_secs()
                );
                tracing::error!(%run_id, job = %result.job, waited_secs = waited.as_secs(), "Timed out waiting for job");
                self.notify(Outcome::TimedOut, &result, archive_dir).await;
                Err(WatchError::Timeout {
                    job: result.job.clone(),
                    waited_secs: waited.as_secs(),
                    result: Box::new(result),
                })
            }
        }
    }

    /// Prepare, start and wait.
    pub async fn run(&mut self, request: &WatchRequest) -> Result<RunResult, WatchError> {
        let prepared = self.prepare(request).await?;
        self.execute(request, prepared).await
    }

    async fn notify(&self, outcome: Outcome, result: &RunResult, archive_dir: Option<&Path>) {
        self.notifier
            .notify(&Notification {
                outcome,
                result,
                archive_dir,
            })
            .await;
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

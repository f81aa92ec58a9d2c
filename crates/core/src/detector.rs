//! Completion detection state machine.
//!
//! ```text
//! Started ──► Polling ──┬──► Succeeded
//!               ▲   │   ├──► Failed
//!               └───┘   └──► TimedOut
//! ```
//!
//! Each tick asks exactly one signal source whether the run has finished:
//! the scheduler (status + history) or the artifact directory. Between ticks
//! the detector sleeps on its [`Clock`] for the poll interval, never past
//! the deadline. Errors while polling are treated as "still running".

use std::time::Duration;

use crate::artifact::{has_advanced, ArtifactState, ArtifactWatch};
use crate::clock::{elapsed_since, Clock};
use crate::ports::{ArtifactSource, JobScheduler};
use crate::types::{HistoryBaseline, HistoryRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Started,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
}

impl DetectorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::TimedOut)
    }
}

/// The signal that ended a wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// A whole-job history row newer than the baseline.
    History(HistoryRecord),
    /// The watched directory moved past its baseline.
    Artifact(ArtifactState),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detected {
    pub completion: Completion,
    /// Tick on which the completion was seen, starting at 1.
    pub ticks: u32,
}

/// The deadline passed without a completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut {
    pub ticks: u32,
    pub waited: Duration,
}

pub struct CompletionDetector<'c, C: Clock + ?Sized> {
    clock: &'c C,
    timeout: Duration,
    poll_interval: Duration,
    state: DetectorState,
}

impl<'c, C: Clock + ?Sized> CompletionDetector<'c, C> {
    pub fn new(clock: &'c C, timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            clock,
            timeout,
            poll_interval,
            state: DetectorState::Started,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Mode A: wait for a history row newer than `baseline`.
    ///
    /// With `has_status_query`, history is only consulted while the job
    /// reports idle (or reports nothing); otherwise every tick reads history.
    pub async fn watch_scheduler<S: JobScheduler + ?Sized>(
        &mut self,
        scheduler: &mut S,
        job: &str,
        baseline: HistoryBaseline,
        has_status_query: bool,
    ) -> Result<Detected, TimedOut> {
        let started = self.clock.now();
        let mut ticks = 0u32;
        self.transition(DetectorState::Polling);

        loop {
            ticks += 1;
            if let Some(record) = scheduler_tick(scheduler, job, baseline, has_status_query, ticks).await
            {
                self.transition(if record.succeeded() {
                    DetectorState::Succeeded
                } else {
                    DetectorState::Failed
                });
                return Ok(Detected {
                    completion: Completion::History(record),
                    ticks,
                });
            }
            self.pause_or_expire(started, ticks).await?;
        }
    }

    /// Mode B: wait for the watched directory to advance past `baseline`.
    pub async fn watch_artifacts<A: ArtifactSource + ?Sized>(
        &mut self,
        source: &A,
        watch: &ArtifactWatch,
        baseline: &ArtifactState,
    ) -> Result<Detected, TimedOut> {
        let started = self.clock.now();
        let mut ticks = 0u32;
        self.transition(DetectorState::Polling);

        loop {
            ticks += 1;
            match source.snapshot(&watch.dir, &watch.pattern).await {
                Ok(current) if has_advanced(baseline, &current, watch.policy) => {
                    self.transition(DetectorState::Succeeded);
                    return Ok(Detected {
                        completion: Completion::Artifact(current),
                        ticks,
                    });
                }
                Ok(current) => {
                    tracing::trace!(tick = ticks, matched = current.matched, "Artifact unchanged");
                }
                Err(e) => {
                    tracing::debug!(
                        tick = ticks,
                        dir = %watch.dir.display(),
                        error = %e,
                        "Artifact scan failed, still waiting",
                    );
                }
            }
            self.pause_or_expire(started, ticks).await?;
        }
    }

    /// Sleep until the next tick, or give up once the deadline is reached.
    async fn pause_or_expire(
        &mut self,
        started: chrono::DateTime<chrono::Utc>,
        ticks: u32,
    ) -> Result<(), TimedOut> {
        let waited = elapsed_since(self.clock, started);
        if waited >= self.timeout {
            self.transition(DetectorState::TimedOut);
            return Err(TimedOut { ticks, waited });
        }
        let remaining = self.timeout - waited;
        self.clock.sleep(self.poll_interval.min(remaining)).await;
        Ok(())
    }

    fn transition(&mut self, next: DetectorState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "Detector state change");
            self.state = next;
        }
    }
}

async fn scheduler_tick<S: JobScheduler + ?Sized>(
    scheduler: &mut S,
    job: &str,
    baseline: HistoryBaseline,
    has_status_query: bool,
    tick: u32,
) -> Option<HistoryRecord> {
    if has_status_query {
        match scheduler.execution_status(job).await {
            Ok(Some(status)) if !status.is_idle() => {
                tracing::trace!(tick, status = status.0, "Job still executing");
                return None;
            }
            Ok(_) => {}
            // Status is advisory; history decides whether the run finished.
            Err(e) => {
                tracing::debug!(tick, error = %e, "Status query failed, checking history");
            }
        }
    }

    match scheduler.latest_history(job).await {
        Ok(Some(record)) if baseline.is_superseded_by(record.instance_id) => Some(record),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(tick, error = %e, "History query failed, still waiting");
            None
        }
    }
}

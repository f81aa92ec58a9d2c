//! Caller-supplied parameters for one start-and-wait invocation.

use std::time::Duration;

use crate::artifact::ArtifactWatch;
use crate::error::CoreError;
use crate::types::StartStep;

/// Default maximum wait, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 1800;

/// Default delay between poll ticks, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// SQL Agent job names are `sysname` (128 characters).
const MAX_JOB_NAME_LEN: usize = 128;

#[derive(Debug, Clone)]
pub struct WatchRequest {
    pub job_name: String,
    /// Treat `job_name` as a `LIKE` filter that must match exactly one job.
    pub fuzzy: bool,
    pub start_step: Option<StartStep>,
    /// When set, completion is detected from this directory (file-watch mode)
    /// instead of the scheduler.
    pub artifact: Option<ArtifactWatch>,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WatchRequest {
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            fuzzy: false,
            start_step: None,
            artifact: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }

    pub fn fuzzy(mut self, fuzzy: bool) -> Self {
        self.fuzzy = fuzzy;
        self
    }

    pub fn start_step(mut self, step: StartStep) -> Self {
        self.start_step = Some(step);
        self
    }

    pub fn watch_artifacts(mut self, watch: ArtifactWatch) -> Self {
        self.artifact = Some(watch);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Validate the request.
    ///
    /// Rules:
    /// - Job name must not be blank and must fit in `sysname`.
    /// - Step ids start at 1; step names must not be blank.
    /// - Timeout and poll interval must be non-zero.
    pub fn validate(&self) -> Result<(), CoreError> {
        let name = self.job_name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation(
                "Job name must not be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_JOB_NAME_LEN {
            return Err(CoreError::Validation(format!(
                "Job name must not exceed {MAX_JOB_NAME_LEN} characters"
            )));
        }

        match &self.start_step {
            Some(StartStep::Id(id)) if *id < 1 => {
                return Err(CoreError::Validation(format!(
                    "Step id must be at least 1, got {id}"
                )));
            }
            Some(StartStep::Name(step)) if step.trim().is_empty() => {
                return Err(CoreError::Validation(
                    "Step name must not be empty".to_string(),
                ));
            }
            _ => {}
        }

        if self.timeout.is_zero() {
            return Err(CoreError::Validation(
                "Timeout must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(CoreError::Validation(
                "Poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let req = WatchRequest::new("Nightly Load");
        assert!(!req.fuzzy);
        assert!(req.artifact.is_none());
        assert_eq!(req.timeout, Duration::from_secs(1800));
        assert_eq!(req.poll_interval, Duration::from_secs(5));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn rejects_blank_job_name() {
        assert!(WatchRequest::new("   ").validate().is_err());
    }

    #[test]
    fn rejects_overlong_job_name() {
        assert!(WatchRequest::new("x".repeat(129)).validate().is_err());
        assert!(WatchRequest::new("x".repeat(128)).validate().is_ok());
    }

    #[test]
    fn rejects_bad_steps() {
        let req = WatchRequest::new("Nightly Load").start_step(StartStep::Id(0));
        assert!(req.validate().is_err());
        let req = WatchRequest::new("Nightly Load").start_step(StartStep::Name(" ".into()));
        assert!(req.validate().is_err());
        let req = WatchRequest::new("Nightly Load").start_step(StartStep::Id(2));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn rejects_zero_durations() {
        let req = WatchRequest::new("Nightly Load").timeout(Duration::ZERO);
        assert!(req.validate().is_err());
        let req = WatchRequest::new("Nightly Load").poll_interval(Duration::ZERO);
        assert!(req.validate().is_err());
    }
}

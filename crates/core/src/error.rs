use std::path::PathBuf;

use crate::ports::SchedulerError;
use crate::types::{RunResult, StartStep};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Every way a start-and-wait invocation can end other than success.
///
/// Resolution and directory errors are raised before the job is started.
/// `Timeout` and `JobFailed` carry the terminal [`RunResult`] so callers can
/// still report what was observed.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error("No SQL Agent job matches '{pattern}'")]
    JobNotFound { pattern: String },

    #[error("'{pattern}' matches {} jobs, supply a more specific name: {}", matches.len(), matches.join(", "))]
    AmbiguousJob {
        pattern: String,
        matches: Vec<String>,
    },

    #[error("Job '{job}' has no step {step}")]
    StepNotFound { job: String, step: StartStep },

    #[error("Archive directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Timed out after {waited_secs}s waiting for job '{job}'")]
    Timeout {
        job: String,
        waited_secs: u64,
        result: Box<RunResult>,
    },

    #[error("Job '{job}' failed (run_status={status_code}): {message}")]
    JobFailed {
        job: String,
        status_code: i32,
        message: String,
        result: Box<RunResult>,
    },

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Artifact scan failed: {0}")]
    Artifact(std::io::Error),
}

impl WatchError {
    /// Short machine-readable category, stable across message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "invalid_request",
            Self::JobNotFound { .. } | Self::AmbiguousJob { .. } | Self::StepNotFound { .. } => {
                "resolution"
            }
            Self::DirectoryNotFound(_) => "directory_not_found",
            Self::Timeout { .. } => "timeout",
            Self::JobFailed { .. } => "job_failed",
            Self::Scheduler(_) => "scheduler",
            Self::Artifact(_) => "artifact",
        }
    }

    /// The terminal record attached to timeouts and job failures.
    pub fn run_result(&self) -> Option<&RunResult> {
        match self {
            Self::Timeout { result, .. } | Self::JobFailed { result, .. } => Some(result),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_ambiguous_lists_matches() {
        let err = WatchError::AmbiguousJob {
            pattern: "%Load%".to_string(),
            matches: vec!["Nightly Load".to_string(), "Weekly Load".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "'%Load%' matches 2 jobs, supply a more specific name: Nightly Load, Weekly Load"
        );
        assert_eq!(err.kind(), "resolution");
    }

    #[test]
    fn display_step_not_found() {
        let err = WatchError::StepNotFound {
            job: "Nightly Load".to_string(),
            step: StartStep::Id(7),
        };
        assert_eq!(err.to_string(), "Job 'Nightly Load' has no step id 7");
    }

    #[test]
    fn display_directory_not_found() {
        let err = WatchError::DirectoryNotFound(PathBuf::from("/mnt/archive"));
        assert_eq!(err.to_string(), "Archive directory not found: /mnt/archive");
        assert_eq!(err.kind(), "directory_not_found");
    }

    #[test]
    fn validation_is_transparent() {
        let err = WatchError::from(CoreError::Validation("bad".to_string()));
        assert_eq!(err.to_string(), "Validation failed: bad");
        assert!(err.run_result().is_none());
    }
}

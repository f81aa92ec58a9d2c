//! Rendering of results and mapping of outcomes to process exit codes.

use serde::Serialize;
use serde_json::json;

use jobwatch_core::artifact::ArtifactState;
use jobwatch_core::runner::PreparedRun;
use jobwatch_core::{RunResult, WatchError};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_JOB_FAILED: u8 = 1;
pub const EXIT_TIMEOUT: u8 = 2;
/// Job, step or archive directory could not be resolved.
pub const EXIT_RESOLUTION: u8 = 3;
/// Bad configuration, or the scheduler could not be reached.
pub const EXIT_CONFIG: u8 = 4;

pub fn exit_code(err: &WatchError) -> u8 {
    match err {
        WatchError::JobFailed { .. } => EXIT_JOB_FAILED,
        WatchError::Timeout { .. } => EXIT_TIMEOUT,
        WatchError::JobNotFound { .. }
        | WatchError::AmbiguousJob { .. }
        | WatchError::StepNotFound { .. }
        | WatchError::DirectoryNotFound(_)
        | WatchError::Artifact(_) => EXIT_RESOLUTION,
        WatchError::Invalid(_) | WatchError::Scheduler(_) => EXIT_CONFIG,
    }
}

pub fn render_success(result: &RunResult) -> String {
    let mut line = format!(
        "Job '{}' succeeded ({}, {} polls)",
        result.job, result.mode, result.polls
    );
    if !result.message.is_empty() {
        line.push_str(": ");
        line.push_str(&result.message);
    }
    line
}

pub fn render_failure(err: &WatchError) -> String {
    format!("{err}")
}

pub fn success_json(result: &RunResult) -> serde_json::Value {
    json!({ "ok": true, "result": result })
}

pub fn failure_json(err: &WatchError) -> serde_json::Value {
    json!({
        "ok": false,
        "kind": err.kind(),
        "error": err.to_string(),
        "result": err.run_result(),
    })
}

/// What a `--dry-run` found out.
#[derive(Debug, Serialize)]
pub struct DryRunReport {
    pub job: String,
    pub step: Option<String>,
    pub history_baseline: i64,
    pub artifact_baseline: Option<ArtifactState>,
    pub connection: String,
}

impl DryRunReport {
    pub fn new(prepared: &PreparedRun, connection: String) -> Self {
        Self {
            job: prepared.job.name().to_string(),
            step: prepared.job.step().map(str::to_string),
            history_baseline: prepared.history_baseline.instance_id(),
            artifact_baseline: prepared.artifact_baseline.clone(),
            connection,
        }
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("Job:              {}", self.job),
            format!(
                "Start step:       {}",
                self.step.as_deref().unwrap_or("(first step)")
            ),
            format!("History baseline: {}", self.history_baseline),
        ];
        if let Some(state) = &self.artifact_baseline {
            let newest = state
                .newest_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string());
            lines.push(format!(
                "Artifacts:        {} matching, newest {newest}",
                state.matched
            ));
        }
        lines.push(format!("Connection:       {}", self.connection));
        lines.join("\n")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use jobwatch_core::error::CoreError;
    use jobwatch_core::ports::SchedulerError;
    use jobwatch_core::types::StartStep;

    use super::*;

    #[test]
    fn exit_codes_by_kind() {
        assert_eq!(
            exit_code(&WatchError::JobNotFound {
                pattern: "%x%".into()
            }),
            EXIT_RESOLUTION
        );
        assert_eq!(
            exit_code(&WatchError::StepNotFound {
                job: "Nightly Load".into(),
                step: StartStep::Id(3)
            }),
            EXIT_RESOLUTION
        );
        assert_eq!(
            exit_code(&WatchError::DirectoryNotFound(PathBuf::from("/x"))),
            EXIT_RESOLUTION
        );
        assert_eq!(
            exit_code(&WatchError::Invalid(CoreError::Validation("bad".into()))),
            EXIT_CONFIG
        );
        assert_eq!(
            exit_code(&WatchError::Scheduler(SchedulerError::Connection(
                "refused".into()
            ))),
            EXIT_CONFIG
        );
    }

    #[test]
    fn failure_json_without_result() {
        let err = WatchError::DirectoryNotFound(PathBuf::from("/archive"));
        let value = failure_json(&err);
        assert_eq!(value["ok"], false);
        assert_eq!(value["kind"], "directory_not_found");
        assert!(value["result"].is_null());
    }
}

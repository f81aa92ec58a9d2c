use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::{EXEC_IDLE, RUN_STATUS_SUCCEEDED};

/// `msdb.dbo.sysjobhistory.instance_id`.
pub type InstanceId = i64;

// ---------------------------------------------------------------------------
// Job handle
// ---------------------------------------------------------------------------

/// Where a job run should begin, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StartStep {
    Id(i32),
    Name(String),
}

impl StartStep {
    /// Interpret a raw argument: all-digit input is a step id, anything else a step name.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i32>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Name(trimmed.to_string()),
        }
    }
}

impl fmt::Display for StartStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Name(name) => write!(f, "'{name}'"),
        }
    }
}

/// A job name and starting step that were checked against the scheduler.
///
/// The step is always in name form because `sp_start_job` is invoked with
/// `@step_name`; numeric ids are translated during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobHandle {
    name: String,
    step: Option<String>,
}

impl JobHandle {
    pub fn new(name: impl Into<String>, step: Option<String>) -> Self {
        Self {
            name: name.into(),
            step,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` means the job starts from its configured first step.
    pub fn step(&self) -> Option<&str> {
        self.step.as_deref()
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Newest whole-job history instance id seen before a run was started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HistoryBaseline(InstanceId);

impl HistoryBaseline {
    pub fn new(instance_id: InstanceId) -> Self {
        Self(instance_id.max(0))
    }

    pub fn instance_id(&self) -> InstanceId {
        self.0
    }

    /// Whether a history row was written after this baseline was taken.
    pub fn is_superseded_by(&self, instance_id: InstanceId) -> bool {
        instance_id > self.0
    }
}

/// A whole-job (`step_id = 0`) row of `msdb.dbo.sysjobhistory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub instance_id: InstanceId,
    pub run_status: i32,
    pub message: String,
    /// `YYYYMMDD` as stored by SQL Server Agent.
    pub run_date: Option<i32>,
    /// `HHMMSS` as stored by SQL Server Agent.
    pub run_time: Option<i32>,
    /// `HHMMSS` elapsed time as stored by SQL Server Agent.
    pub run_duration: Option<i32>,
}

impl HistoryRecord {
    pub fn succeeded(&self) -> bool {
        self.run_status == RUN_STATUS_SUCCEEDED
    }

    /// Local server time at which the run started.
    pub fn started_at(&self) -> Option<NaiveDateTime> {
        decode_run_datetime(self.run_date?, self.run_time.unwrap_or(0))
    }

    pub fn duration(&self) -> Option<Duration> {
        decode_hhmmss(self.run_duration?)
    }
}

/// Decode the integer `run_date` / `run_time` pair used by `sysjobhistory`.
pub fn decode_run_datetime(run_date: i32, run_time: i32) -> Option<NaiveDateTime> {
    if run_date <= 0 || run_time < 0 {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(
        run_date / 10_000,
        (run_date / 100 % 100) as u32,
        (run_date % 100) as u32,
    )?;
    let time = NaiveTime::from_hms_opt(
        (run_time / 10_000) as u32,
        (run_time / 100 % 100) as u32,
        (run_time % 100) as u32,
    )?;
    Some(date.and_time(time))
}

/// Decode an `HHMMSS` integer into a duration. Hours may exceed 99.
pub fn decode_hhmmss(value: i32) -> Option<Duration> {
    if value < 0 {
        return None;
    }
    let value = value as u64;
    let secs = (value / 10_000) * 3600 + (value / 100 % 100) * 60 + value % 100;
    Some(Duration::from_secs(secs))
}

/// `current_execution_status` as reported by `sp_help_job`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionStatus(pub i32);

impl ExecutionStatus {
    pub fn is_idle(&self) -> bool {
        self.0 == EXEC_IDLE
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// A file observed in a watched directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Which signal ended the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    SchedulerStatus,
    FileWatch,
    TimeoutFallback,
}

impl DetectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchedulerStatus => "scheduler_status",
            Self::FileWatch => "file_watch",
            Self::TimeoutFallback => "timeout_fallback",
        }
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal record of one start-and-wait invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub job: String,
    pub step: Option<String>,
    pub success: bool,
    pub mode: DetectionMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Number of poll ticks performed before the wait ended.
    pub polls: u32,
    pub message: String,
    /// `run_status` of the history row that ended a scheduler-status wait.
    pub status_code: Option<i32>,
    pub run_started_at: Option<NaiveDateTime>,
    pub run_duration_secs: Option<u64>,
    /// Newest matching file when a file-watch wait ended.
    pub artifact: Option<ArtifactFile>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_step_parse() {
        assert_eq!(StartStep::parse("3"), StartStep::Id(3));
        assert_eq!(StartStep::parse(" 12 "), StartStep::Id(12));
        assert_eq!(
            StartStep::parse("Load staging"),
            StartStep::Name("Load staging".to_string())
        );
    }

    #[test]
    fn baseline_only_superseded_by_newer_rows() {
        let baseline = HistoryBaseline::new(120);
        assert!(!baseline.is_superseded_by(119));
        assert!(!baseline.is_superseded_by(120));
        assert!(baseline.is_superseded_by(121));
        assert_eq!(HistoryBaseline::new(-5).instance_id(), 0);
    }

    #[test]
    fn decode_history_timestamps() {
        let started = decode_run_datetime(20240315, 73005).expect("valid");
        assert_eq!(started.to_string(), "2024-03-15 07:30:05");
        assert!(decode_run_datetime(0, 0).is_none());
        assert!(decode_run_datetime(20241340, 0).is_none());
    }

    #[test]
    fn decode_duration_allows_long_runs() {
        assert_eq!(decode_hhmmss(13), Some(Duration::from_secs(13)));
        assert_eq!(decode_hhmmss(10203), Some(Duration::from_secs(3723)));
        assert_eq!(decode_hhmmss(1000000), Some(Duration::from_secs(360_000)));
        assert_eq!(decode_hhmmss(-1), None);
    }

    #[test]
    fn history_record_success_only_for_status_one() {
        let mut record = HistoryRecord {
            instance_id: 1,
            run_status: 1,
            message: String::new(),
            run_date: Some(20240101),
            run_time: None,
            run_duration: Some(130),
        };
        assert!(record.succeeded());
        assert_eq!(record.duration(), Some(Duration::from_secs(90)));
        assert_eq!(record.started_at().expect("date").to_string(), "2024-01-01 00:00:00");
        record.run_status = 3;
        assert!(!record.succeeded());
    }

    #[test]
    fn detection_mode_serializes_snake_case() {
        let json = serde_json::to_string(&DetectionMode::FileWatch).expect("serialize");
        assert_eq!(json, "\"file_watch\"");
        assert_eq!(DetectionMode::TimeoutFallback.to_string(), "timeout_fallback");
    }
}

//! Well-known SQL Server Agent status codes.
//!
//! `RUN_STATUS_*` values appear in `msdb.dbo.sysjobhistory.run_status`;
//! `EXEC_*` values are the `current_execution_status` column returned by
//! `msdb.dbo.sp_help_job`.

/// The run failed.
pub const RUN_STATUS_FAILED: i32 = 0;

/// The run succeeded. The only code treated as success.
pub const RUN_STATUS_SUCCEEDED: i32 = 1;

/// The step is waiting to be retried.
pub const RUN_STATUS_RETRY: i32 = 2;

/// The run was cancelled.
pub const RUN_STATUS_CANCELED: i32 = 3;

/// The run is still in progress.
pub const RUN_STATUS_IN_PROGRESS: i32 = 4;

pub const EXEC_EXECUTING: i32 = 1;
pub const EXEC_WAITING_FOR_THREAD: i32 = 2;
pub const EXEC_BETWEEN_RETRIES: i32 = 3;
pub const EXEC_IDLE: i32 = 4;
pub const EXEC_SUSPENDED: i32 = 5;
pub const EXEC_PERFORMING_COMPLETION_ACTIONS: i32 = 7;

/// Human-readable label for a `run_status` code.
pub fn run_status_label(code: i32) -> &'static str {
    match code {
        RUN_STATUS_FAILED => "failed",
        RUN_STATUS_SUCCEEDED => "succeeded",
        RUN_STATUS_RETRY => "retry",
        RUN_STATUS_CANCELED => "canceled",
        RUN_STATUS_IN_PROGRESS => "in progress",
        _ => "unknown",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! T-SQL issued against `msdb`.
//!
//! Parameters use the driver's positional `@P1`, `@P2` placeholders. History
//! queries only consider whole-job outcome rows (`step_id = 0`).

/// Job names matching a `LIKE` filter.
pub const FIND_JOBS: &str = "\
    SELECT name FROM msdb.dbo.sysjobs WITH (NOLOCK) \
    WHERE name LIKE @P1 \
    ORDER BY name";

/// Step name for a numeric step id.
pub const STEP_NAME_BY_ID: &str = "\
    SELECT s.step_name \
    FROM msdb.dbo.sysjobsteps s WITH (NOLOCK) \
    JOIN msdb.dbo.sysjobs j WITH (NOLOCK) ON j.job_id = s.job_id \
    WHERE j.name = @P1 AND s.step_id = @P2";

/// Whether a step with this exact name exists.
pub const STEP_EXISTS: &str = "\
    SELECT COUNT(*) AS step_count \
    FROM msdb.dbo.sysjobsteps s WITH (NOLOCK) \
    JOIN msdb.dbo.sysjobs j WITH (NOLOCK) ON j.job_id = s.job_id \
    WHERE j.name = @P1 AND s.step_name = @P2";

/// Newest whole-job history instance, `0` when there is none.
pub const MAX_HISTORY_INSTANCE: &str = "\
    SELECT ISNULL(MAX(h.instance_id), 0) AS max_id \
    FROM msdb.dbo.sysjobhistory h WITH (NOLOCK) \
    WHERE h.job_id = (SELECT job_id FROM msdb.dbo.sysjobs WHERE name = @P1) \
      AND h.step_id = 0";

/// Newest whole-job history row.
pub const LATEST_HISTORY: &str = "\
    SELECT TOP 1 instance_id, run_status, run_date, run_time, run_duration, message \
    FROM msdb.dbo.sysjobhistory WITH (NOLOCK) \
    WHERE job_id = (SELECT job_id FROM msdb.dbo.sysjobs WHERE name = @P1) \
      AND step_id = 0 \
    ORDER BY instance_id DESC";

pub const START_JOB: &str = "EXEC msdb.dbo.sp_start_job @job_name = @P1";

pub const START_JOB_AT_STEP: &str =
    "EXEC msdb.dbo.sp_start_job @job_name = @P1, @step_name = @P2";

/// Job-level row of `sp_help_job`, carrying `current_execution_status`.
pub const HELP_JOB: &str = "EXEC msdb.dbo.sp_help_job @job_name = @P1, @job_aspect = N'JOB'";

/// Cheap probe: succeeds only if the login may call `sp_help_job`.
pub const HELP_JOB_PROBE: &str = "EXEC msdb.dbo.sp_help_job @execution_status = 4";

/// Column of `sp_help_job` holding the execution status code.
pub const EXECUTION_STATUS_COLUMN: &str = "current_execution_status";

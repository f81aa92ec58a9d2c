//! Sanity checks on the T-SQL sent to `msdb`.

use jobwatch_db::queries;

// ---------------------------------------------------------------------------
// Test: history queries only see whole-job rows
// ---------------------------------------------------------------------------

/// Per-step rows would end a wait as soon as the first step finished.
#[test]
fn history_queries_filter_outcome_rows() {
    for sql in [queries::MAX_HISTORY_INSTANCE, queries::LATEST_HISTORY] {
        assert!(sql.contains("step_id = 0"), "missing step filter: {sql}");
        assert!(sql.contains("@P1"), "job name not parameterised: {sql}");
    }
}

#[test]
fn latest_history_reads_newest_first() {
    assert!(queries::LATEST_HISTORY.contains("TOP 1"));
    assert!(queries::LATEST_HISTORY.contains("ORDER BY instance_id DESC"));
}

// ---------------------------------------------------------------------------
// Test: job names are never interpolated
// ---------------------------------------------------------------------------

#[test]
fn statements_take_parameters() {
    for sql in [
        queries::FIND_JOBS,
        queries::STEP_NAME_BY_ID,
        queries::STEP_EXISTS,
        queries::START_JOB,
        queries::START_JOB_AT_STEP,
        queries::HELP_JOB,
    ] {
        assert!(sql.contains("@P1"), "{sql}");
        assert!(!sql.contains('{'), "{sql}");
    }
    assert!(queries::STEP_NAME_BY_ID.contains("@P2"));
    assert!(queries::START_JOB_AT_STEP.contains("@step_name = @P2"));
}

/// The probe asks for idle jobs (status 4), which any caller may list.
#[test]
fn status_probe_uses_idle_code() {
    assert!(queries::HELP_JOB_PROBE.ends_with("@execution_status = 4"));
}

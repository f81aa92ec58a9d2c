//! Pre-start snapshot of a job's run history.

use crate::ports::JobScheduler;
use crate::types::HistoryBaseline;

/// Record the newest whole-job history instance before a new run starts.
///
/// Never fails: a job without history, or a history table the account may
/// not read, both yield a baseline of `0`.
pub async fn capture<S: JobScheduler + ?Sized>(scheduler: &mut S, job: &str) -> HistoryBaseline {
    match scheduler.max_history_instance(job).await {
        Ok(instance_id) => {
            let baseline = HistoryBaseline::new(instance_id);
            tracing::debug!(job = %job, baseline = baseline.instance_id(), "History baseline captured");
            baseline
        }
        Err(e) => {
            tracing::info!(job = %job, error = %e, "History baseline unavailable, assuming none");
            HistoryBaseline::default()
        }
    }
}

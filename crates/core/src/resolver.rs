//! Job and step resolution.
//!
//! Turns caller input into a [`JobHandle`] before anything is started.
//! Lookups that fail on missing permissions degrade to trusting the caller;
//! a step that cannot be found always aborts, because starting the job from
//! the wrong step is worse than not starting it.

use crate::error::WatchError;
use crate::pattern::like_filter;
use crate::ports::JobScheduler;
use crate::types::{JobHandle, StartStep};

/// Return the exact job name to operate on.
///
/// With `fuzzy` off the input is returned unchanged. With `fuzzy` on the
/// input is used as a `LIKE` filter and must match exactly one job.
pub async fn resolve_job_name<S: JobScheduler + ?Sized>(
    scheduler: &mut S,
    job_name: &str,
    fuzzy: bool,
) -> Result<String, WatchError> {
    if !fuzzy {
        return Ok(job_name.to_string());
    }

    let filter = like_filter(job_name);
    let mut matches = match scheduler.find_jobs(&filter).await {
        Ok(matches) => matches,
        Err(e) if e.is_permission_denied() => {
            tracing::info!(
                job = %job_name,
                error = %e,
                "Cannot read job catalog, using the name as given",
            );
            return Ok(job_name.to_string());
        }
        Err(e) => return Err(e.into()),
    };

    match matches.len() {
        0 => Err(WatchError::JobNotFound { pattern: filter }),
        1 => {
            let name = matches.remove(0);
            tracing::debug!(pattern = %filter, job = %name, "Fuzzy job name resolved");
            Ok(name)
        }
        _ => Err(WatchError::AmbiguousJob {
            pattern: filter,
            matches,
        }),
    }
}

/// Translate a caller-supplied start step into a verified step name.
pub async fn resolve_step<S: JobScheduler + ?Sized>(
    scheduler: &mut S,
    job: &str,
    step: &StartStep,
) -> Result<String, WatchError> {
    let not_found = || WatchError::StepNotFound {
        job: job.to_string(),
        step: step.clone(),
    };

    match step {
        StartStep::Id(id) => scheduler.step_name(job, *id).await?.ok_or_else(not_found),
        StartStep::Name(name) => {
            if scheduler.has_step(job, name).await? {
                Ok(name.clone())
            } else {
                Err(not_found())
            }
        }
    }
}

/// Resolve job name and optional start step in one go.
pub async fn resolve<S: JobScheduler + ?Sized>(
    scheduler: &mut S,
    job_name: &str,
    fuzzy: bool,
    step: Option<&StartStep>,
) -> Result<JobHandle, WatchError> {
    let name = resolve_job_name(scheduler, job_name, fuzzy).await?;
    let step = match step {
        Some(step) => Some(resolve_step(scheduler, &name, step).await?),
        None => None,
    };
    Ok(JobHandle::new(name, step))
}

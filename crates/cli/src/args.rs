//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use jobwatch_core::artifact::{ArtifactWatch, FileWatchPolicy};
use jobwatch_core::pattern::{FilePattern, DEFAULT_ARTIFACT_PATTERN};
use jobwatch_core::request::{DEFAULT_POLL_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS};
use jobwatch_core::{CoreError, StartStep, WatchRequest};

/// Start a SQL Server Agent job and wait until it has definitely finished.
///
/// Connection settings come from `JOBWATCH_SQL_*` environment variables
/// (a `.env` file is honoured).
#[derive(Parser, Debug)]
#[command(name = "jobwatch", version, about, long_about = None)]
pub struct Cli {
    /// Job name. Matched exactly unless --fuzzy is given.
    pub job: String,

    /// Treat the job name as a LIKE filter that must match exactly one job.
    #[arg(long)]
    pub fuzzy: bool,

    /// Start from this step: a numeric step id or a step name.
    #[arg(long, value_name = "ID|NAME")]
    pub step: Option<String>,

    /// Detect completion from files appearing in this directory instead of
    /// the job history. Opened on success.
    #[arg(long, value_name = "DIR", env = "JOBWATCH_ARCHIVE_DIR")]
    pub archive_dir: Option<PathBuf>,

    /// File name pattern watched in --archive-dir.
    #[arg(long, value_name = "GLOB", default_value = DEFAULT_ARTIFACT_PATTERN)]
    pub pattern: String,

    /// Only a new file counts; an existing file being rewritten does not.
    #[arg(long)]
    pub require_new_file: bool,

    /// Maximum time to wait, in seconds.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS, env = "JOBWATCH_TIMEOUT_SECS")]
    pub timeout: u64,

    /// Delay between polls, in seconds.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_POLL_INTERVAL_SECS, env = "JOBWATCH_POLL_INTERVAL_SECS")]
    pub poll_interval: u64,

    /// Resolve the job and take baselines, but do not start anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the final result as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Do not beep when the wait ends.
    #[arg(long)]
    pub no_sound: bool,

    /// Do not open --archive-dir on success.
    #[arg(long)]
    pub no_open: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, env = "JOBWATCH_LOG_JSON")]
    pub log_json: bool,
}

impl Cli {
    /// Translate the arguments into a watch request.
    pub fn to_request(&self) -> Result<WatchRequest, CoreError> {
        let mut request = WatchRequest::new(self.job.trim())
            .fuzzy(self.fuzzy)
            .timeout(Duration::from_secs(self.timeout))
            .poll_interval(Duration::from_secs(self.poll_interval));

        if let Some(step) = self.step.as_deref().filter(|s| !s.trim().is_empty()) {
            request = request.start_step(StartStep::parse(step));
        }

        if let Some(dir) = &self.archive_dir {
            let policy = if self.require_new_file {
                FileWatchPolicy::RequireNewFile
            } else {
                FileWatchPolicy::ModifiedInPlace
            };
            request = request.watch_artifacts(
                ArtifactWatch::new(dir)
                    .with_pattern(FilePattern::new(&self.pattern)?)
                    .with_policy(policy),
            );
        }

        request.validate()?;
        Ok(request)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

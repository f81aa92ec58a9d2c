//! Wiring of configuration, adapters and the runner for one invocation.

use anyhow::Context;

use jobwatch_core::artifact::DirectoryScanner;
use jobwatch_core::clock::SystemClock;
use jobwatch_core::JobRunner;
use jobwatch_db::{ConnectionConfig, SqlAgentScheduler};
use jobwatch_events::{DesktopNotifier, EmailConfig, EmailNotifier, NotifierSet};

use crate::args::Cli;
use crate::output::{self, DryRunReport, EXIT_SUCCESS};

/// Build the notifiers selected by flags and environment.
pub fn build_notifiers(cli: &Cli) -> NotifierSet {
    let mut notifiers =
        NotifierSet::new().with(DesktopNotifier::new(!cli.no_sound, !cli.no_open));
    if !cli.dry_run {
        if let Some(config) = EmailConfig::from_env() {
            tracing::info!(smtp_host = %config.smtp_host, recipients = config.to.len(), "Email notifications enabled");
            notifiers.push(Box::new(EmailNotifier::new(config)));
        }
    }
    notifiers
}

/// Run one invocation and return the process exit code.
///
/// Errors returned here are configuration or connection problems; outcomes
/// of the wait itself are mapped to exit codes.
pub async fn run(cli: Cli) -> anyhow::Result<u8> {
    let request = cli.to_request().context("Invalid arguments")?;
    let connection = ConnectionConfig::from_env().context("Invalid SQL Server configuration")?;

    tracing::info!(
        job = %request.job_name,
        fuzzy = request.fuzzy,
        timeout_secs = request.timeout.as_secs(),
        poll_interval_secs = request.poll_interval.as_secs(),
        archive_dir = ?request.artifact.as_ref().map(|a| a.dir.display().to_string()),
        "Loaded configuration",
    );

    let scheduler = SqlAgentScheduler::connect(&connection)
        .await
        .with_context(|| format!("Failed to connect to {}", connection.server))?;

    let mut runner = JobRunner::new(
        scheduler,
        DirectoryScanner,
        SystemClock,
        build_notifiers(&cli),
    );

    if cli.dry_run {
        return Ok(match runner.prepare(&request).await {
            Ok(prepared) => {
                let report = DryRunReport::new(&prepared, connection.connection_string());
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    println!("{}", report.render());
                }
                EXIT_SUCCESS
            }
            Err(err) => report_failure(&cli, &err)?,
        });
    }

    Ok(match runner.run(&request).await {
        Ok(result) => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::success_json(&result))?
                );
            } else {
                println!("{}", output::render_success(&result));
            }
            EXIT_SUCCESS
        }
        Err(err) => report_failure(&cli, &err)?,
    })
}

fn report_failure(cli: &Cli, err: &jobwatch_core::WatchError) -> anyhow::Result<u8> {
    tracing::error!(kind = err.kind(), error = %err, "Job watch failed");
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::failure_json(err))?
        );
    } else {
        eprintln!("{}", output::render_failure(err));
    }
    Ok(output::exit_code(err))
}

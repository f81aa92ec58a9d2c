//! `jobwatch` -- start a SQL Server Agent job and wait for it to finish.
//!
//! # Environment variables
//!
//! | Variable                      | Required | Default | Description                      |
//! |-------------------------------|----------|---------|----------------------------------|
//! | `JOBWATCH_SQL_SERVER`         | yes      | --      | `host`, `host,port` or `host\INSTANCE` |
//! | `JOBWATCH_SQL_DATABASE`       | no       | `msdb`  | Agent catalog database           |
//! | `JOBWATCH_SQL_USER`           | no       | --      | SQL login; integrated auth if unset |
//! | `JOBWATCH_SQL_PASSWORD`       | no       | --      | SQL login password               |
//! | `JOBWATCH_SQL_ENCRYPT`        | no       | `true`  | Require TLS                      |
//! | `JOBWATCH_SQL_TRUST_CERT`     | no       | `true`  | Accept any server certificate    |
//! | `SMTP_HOST`                   | no       | --      | Enables outcome emails           |
//! | `NOTIFY_EMAIL_TO`             | no       | --      | Comma-separated recipients       |
//! | `RUST_LOG`                    | no       | `jobwatch=info` | Log filter               |
//!
//! # Exit codes
//!
//! `0` success, `1` job failed, `2` timeout, `3` job/step/directory not
//! found, `4` configuration or connection error.

use std::process::ExitCode;

use clap::Parser;

use jobwatch_cli::args::Cli;
use jobwatch_cli::output::EXIT_CONFIG;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    jobwatch_cli::init_tracing(cli.log_json);

    match jobwatch_cli::app::run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "jobwatch aborted");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_CONFIG)
        }
    }
}

//! `jobwatch` command-line front end.
//!
//! Parses arguments, loads configuration from the environment, connects to
//! SQL Server Agent and drives a [`jobwatch_core::JobRunner`].

pub mod app;
pub mod args;
pub mod output;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. Logs go to stderr so stdout stays
/// reserved for results.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "jobwatch=info".into());

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

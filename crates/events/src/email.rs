//! Outcome emails via SMTP.
//!
//! [`EmailNotifier`] wraps the `lettre` async SMTP transport to send a
//! plain-text summary of each finished wait. Configuration is loaded from
//! environment variables; if `SMTP_HOST` or `NOTIFY_EMAIL_TO` is not set,
//! [`EmailConfig::from_env`] returns `None` and no mailer is constructed.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use jobwatch_core::ports::{Notification, Notifier, Outcome};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when neither `SMTP_FROM` nor `SMTP_USER` is set.
const DEFAULT_FROM_ADDRESS: &str = "jobwatch@localhost";

const SMTP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Upgrade the session with STARTTLS. Plain SMTP otherwise.
    pub use_tls: bool,
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub to: Vec<String>,
    pub cc: Vec<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable          | Required | Default                         |
    /// |-------------------|----------|---------------------------------|
    /// | `SMTP_HOST`       | yes      |                                 |
    /// | `SMTP_PORT`       | no       | `587`                           |
    /// | `SMTP_USE_TLS`    | no       | `true`                          |
    /// | `SMTP_FROM`       | no       | `SMTP_USER`, then `jobwatch@localhost` |
    /// | `SMTP_USER`       | no       |                                 |
    /// | `SMTP_PASSWORD`   | no       |                                 |
    /// | `NOTIFY_EMAIL_TO` | yes      | comma-separated                 |
    /// | `NOTIFY_EMAIL_CC` | no       | comma-separated                 |
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let smtp_host = lookup("SMTP_HOST").filter(|h| !h.trim().is_empty())?;
        let to = split_addresses(lookup("NOTIFY_EMAIL_TO").as_deref());
        if to.is_empty() {
            tracing::warn!("SMTP_HOST is set but NOTIFY_EMAIL_TO is empty, email disabled");
            return None;
        }
        let smtp_user = lookup("SMTP_USER").filter(|u| !u.is_empty());
        Some(Self {
            smtp_host: smtp_host.trim().to_string(),
            smtp_port: lookup("SMTP_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            use_tls: lookup("SMTP_USE_TLS")
                .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
            from_address: lookup("SMTP_FROM")
                .filter(|f| !f.is_empty())
                .or_else(|| smtp_user.clone())
                .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user,
            smtp_password: lookup("SMTP_PASSWORD"),
            to,
            cc: split_addresses(lookup("NOTIFY_EMAIL_CC").as_deref()),
        })
    }
}

fn split_addresses(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Message content
// ---------------------------------------------------------------------------

pub fn subject(notification: &Notification<'_>) -> String {
    let verb = match notification.outcome {
        Outcome::Succeeded => "succeeded",
        Outcome::Failed => "failed",
        Outcome::TimedOut => "timed out",
    };
    format!("[jobwatch] {} {verb}", notification.result.job)
}

pub fn body(notification: &Notification<'_>) -> String {
    let result = notification.result;
    let mut lines = vec![
        format!("Job: {}", result.job),
        format!("Outcome: {:?}", notification.outcome),
        format!("Detected by: {}", result.mode),
        format!("Run id: {}", result.run_id),
        format!("Started: {}", result.started_at.to_rfc3339()),
        format!("Finished: {}", result.finished_at.to_rfc3339()),
        format!("Polls: {}", result.polls),
    ];
    if let Some(step) = &result.step {
        lines.insert(1, format!("Start step: {step}"));
    }
    if let Some(code) = result.status_code {
        lines.push(format!("run_status: {code}"));
    }
    if let Some(artifact) = &result.artifact {
        lines.push(format!("Artifact: {}", artifact.path.display()));
    }
    if let Some(dir) = notification.archive_dir {
        lines.push(format!("Archive directory: {}", dir.display()));
    }
    lines.push(String::new());
    lines.push(result.message.clone());
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// EmailNotifier
// ---------------------------------------------------------------------------

pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Assemble the message without sending it.
    pub fn build_message(&self, notification: &Notification<'_>) -> Result<Message, EmailError> {
        let mut builder = Message::builder()
            .from(self.config.from_address.parse::<Mailbox>()?)
            .subject(subject(notification))
            .header(ContentType::TEXT_PLAIN);
        for to in &self.config.to {
            builder = builder.to(to.parse::<Mailbox>()?);
        }
        for cc in &self.config.cc {
            builder = builder.cc(cc.parse::<Mailbox>()?);
        }
        builder
            .body(body(notification))
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    pub async fn send(&self, notification: &Notification<'_>) -> Result<(), EmailError> {
        let email = self.build_message(notification)?;

        let transport_builder = if self.config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
        };
        let mut transport_builder = transport_builder
            .port(self.config.smtp_port)
            .timeout(Some(SMTP_TIMEOUT));

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(
            to = %self.config.to.join(", "),
            job = %notification.result.job,
            "Notification email sent",
        );
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, notification: &Notification<'_>) {
        if let Err(e) = self.send(notification).await {
            tracing::error!(error = %e, job = %notification.result.job, "Failed to send notification email");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

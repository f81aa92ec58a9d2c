//! Integration tests for the notifiers.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use uuid::Uuid;

use jobwatch_core::ports::{Notification, Notifier, Outcome};
use jobwatch_core::{DetectionMode, RunResult};
use jobwatch_events::email::{body, subject};
use jobwatch_events::{DesktopNotifier, EmailConfig, EmailNotifier, NotifierSet};

fn result(success: bool) -> RunResult {
    RunResult {
        run_id: Uuid::nil(),
        job: "Nightly Load".to_string(),
        step: Some("Transform".to_string()),
        success,
        mode: DetectionMode::SchedulerStatus,
        started_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        finished_at: DateTime::from_timestamp(1_700_000_090, 0).unwrap(),
        polls: 18,
        message: "The job succeeded.".to_string(),
        status_code: Some(1),
        run_started_at: None,
        run_duration_secs: Some(88),
        artifact: None,
    }
}

fn email_config() -> EmailConfig {
    EmailConfig {
        smtp_host: "smtp.example.com".to_string(),
        smtp_port: 587,
        use_tls: true,
        from_address: "jobwatch@example.com".to_string(),
        smtp_user: None,
        smtp_password: None,
        to: vec!["ops@example.com".to_string()],
        cc: vec!["dba@example.com".to_string()],
    }
}

struct Counting(Arc<AtomicUsize>);

#[async_trait]
impl Notifier for Counting {
    async fn notify(&self, _notification: &Notification<'_>) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Test: fan-out
// ---------------------------------------------------------------------------

#[tokio::test]
async fn notifier_set_reaches_every_notifier() {
    let count = Arc::new(AtomicUsize::new(0));
    let set = NotifierSet::new()
        .with(Counting(count.clone()))
        .with(Counting(count.clone()))
        .with(DesktopNotifier::new(false, false));
    assert_eq!(set.len(), 3);

    let result = result(true);
    set.notify(&Notification {
        outcome: Outcome::Succeeded,
        result: &result,
        archive_dir: None,
    })
    .await;

    assert_eq!(count.load(Ordering::SeqCst), 2);
}

// ---------------------------------------------------------------------------
// Test: desktop notifier
// ---------------------------------------------------------------------------

/// A vanished archive directory is skipped quietly.
#[tokio::test]
async fn desktop_notifier_ignores_missing_directory() {
    let notifier = DesktopNotifier::new(false, true);
    let result = result(true);
    notifier
        .notify(&Notification {
            outcome: Outcome::Succeeded,
            result: &result,
            archive_dir: Some(Path::new("/definitely/not/here")),
        })
        .await;
}

// ---------------------------------------------------------------------------
// Test: email content
// ---------------------------------------------------------------------------

#[test]
fn subject_names_job_and_outcome() {
    let ok = result(true);
    let failed = result(false);
    let n = |outcome, result| Notification {
        outcome,
        result,
        archive_dir: None,
    };
    assert_eq!(
        subject(&n(Outcome::Succeeded, &ok)),
        "[jobwatch] Nightly Load succeeded"
    );
    assert_eq!(
        subject(&n(Outcome::TimedOut, &failed)),
        "[jobwatch] Nightly Load timed out"
    );
}

#[test]
fn body_lists_run_details() {
    let result = result(true);
    let text = body(&Notification {
        outcome: Outcome::Succeeded,
        result: &result,
        archive_dir: Some(Path::new("/archive")),
    });
    assert!(text.contains("Job: Nightly Load"));
    assert!(text.contains("Start step: Transform"));
    assert!(text.contains("Detected by: scheduler_status"));
    assert!(text.contains("Polls: 18"));
    assert!(text.contains("Archive directory: /archive"));
    assert!(text.ends_with("The job succeeded."));
}

#[test]
fn message_has_all_recipients() {
    let notifier = EmailNotifier::new(email_config());
    let result = result(false);
    let message = notifier
        .build_message(&Notification {
            outcome: Outcome::Failed,
            result: &result,
            archive_dir: None,
        })
        .expect("message builds");

    let raw = String::from_utf8(message.formatted()).expect("utf-8 message");
    assert!(raw.contains("To: ops@example.com"));
    assert!(raw.contains("Cc: dba@example.com"));
    assert!(raw.contains("Subject: [jobwatch] Nightly Load failed"));
}

#[test]
fn bad_sender_address_is_an_error() {
    let mut config = email_config();
    config.from_address = "not an address".to_string();
    let notifier = EmailNotifier::new(config);
    let result = result(true);
    let err = notifier
        .build_message(&Notification {
            outcome: Outcome::Succeeded,
            result: &result,
            archive_dir: None,
        })
        .unwrap_err();
    assert!(err.to_string().contains("Email address parse error"));
}

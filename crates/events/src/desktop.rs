//! Notifier for an operator sitting at the machine that ran the wait.

use async_trait::async_trait;

use jobwatch_core::ports::{Notification, Notifier, Outcome};

use crate::chime::Chime;
use crate::folder;

/// Plays a chime for every outcome and, on success, opens the archive
/// directory when one was configured and still exists.
#[derive(Debug, Clone, Copy)]
pub struct DesktopNotifier {
    pub sound: bool,
    pub open_folder: bool,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self {
            sound: true,
            open_folder: true,
        }
    }
}

impl DesktopNotifier {
    pub fn new(sound: bool, open_folder: bool) -> Self {
        Self { sound, open_folder }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, notification: &Notification<'_>) {
        if self.sound {
            Chime::for_outcome(notification.outcome).play().await;
        }

        if !self.open_folder || notification.outcome != Outcome::Succeeded {
            return;
        }
        let Some(dir) = notification.archive_dir else {
            return;
        };

        let is_dir = tokio::fs::metadata(dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            tracing::debug!(dir = %dir.display(), "Archive directory missing, not opening");
            return;
        }
        if let Err(e) = folder::open_folder(dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "Failed to open archive directory");
        }
    }
}

//! Fan-out over several notifiers.

use async_trait::async_trait;

use jobwatch_core::ports::{Notification, Notifier};

/// Runs every configured notifier in order.
#[derive(Default)]
pub struct NotifierSet {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifiers.push(Box::new(notifier));
        self
    }

    pub fn push(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

#[async_trait]
impl Notifier for NotifierSet {
    async fn notify(&self, notification: &Notification<'_>) {
        for notifier in &self.notifiers {
            notifier.notify(notification).await;
        }
    }
}

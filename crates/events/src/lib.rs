//! Notification side effects fired once a wait has ended.
//!
//! - [`DesktopNotifier`]: chime plus opening the archive folder on success.
//! - [`EmailNotifier`]: plain-text SMTP summary, configured from the
//!   environment.
//! - [`NotifierSet`]: fans one notification out to several notifiers.
//!
//! None of them can change the reported outcome; failures are logged.

pub mod chime;
pub mod desktop;
pub mod email;
pub mod fanout;
pub mod folder;

pub use desktop::DesktopNotifier;
pub use email::{EmailConfig, EmailError, EmailNotifier};
pub use fanout::NotifierSet;

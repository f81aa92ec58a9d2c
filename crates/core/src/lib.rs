//! Core domain logic for watching SQL Server Agent job runs to completion.
//!
//! Everything in this crate is free of database and notification specifics.
//! The scheduler, the artifact directory, the clock and the notifier are all
//! reached through the traits in [`ports`], so the whole start-and-wait flow
//! can run against in-memory fakes.
//!
//! - [`resolver`] turns a caller-supplied job name and step into a [`JobHandle`].
//! - [`baseline`] snapshots the newest whole-job history row before a start.
//! - [`detector`] polls until the run succeeds, fails or times out.
//! - [`runner`] wires the above together and fires notifications.

pub mod artifact;
pub mod baseline;
pub mod clock;
pub mod detector;
pub mod error;
pub mod pattern;
pub mod ports;
pub mod request;
pub mod resolver;
pub mod runner;
pub mod status;
pub mod types;

pub use error::{CoreError, WatchError};
pub use request::WatchRequest;
pub use runner::JobRunner;
pub use types::{DetectionMode, JobHandle, RunResult, StartStep};

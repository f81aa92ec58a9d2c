//! SQL Server Agent adapter.
//!
//! Connects to the scheduler's administrative database (`msdb`) and
//! implements [`jobwatch_core::ports::JobScheduler`] on top of its catalog
//! tables and stored procedures.

pub mod agent;
pub mod config;
pub mod connection;
pub mod error;
pub mod queries;

pub use agent::SqlAgentScheduler;
pub use config::{ConnectionConfig, ServerAddress};

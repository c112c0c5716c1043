//! Process Lifecycle Supervisor Library

pub mod config;
pub mod domain;
pub mod error;
pub mod event_loop;
pub mod lifecycle;
pub mod modules;
pub mod observability;
pub mod schedule;

pub use config::schema::SupervisorConfig;
pub use error::{ProcessError, ProcessResult};
pub use lifecycle::{Phase, Process, Shutdown};

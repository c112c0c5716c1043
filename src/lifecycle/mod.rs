//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs, process.rs):
//!     starting → load modules → initialising → pre-schedules
//!     → pre-init schedules → next-schedule-phase → post-init schedules
//!     → post-schedules → initialised → started → install signals
//!
//! Steady state (process.rs):
//!     main_loop / idle / pause / run_service → event loop
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     request() or SIGINT/SIGTERM → flag set → loop returns
//!     → shutdown listeners fire once → terminated
//! ```
//!
//! # Design Decisions
//! - The controller is an explicit object, not a global
//! - Listener sets are copy-on-write: firing never holds a lock
//! - Signal handlers only store a flag; the loop notices it on its next tick
//! - Every lifecycle step that runs user code is wrapped in a unit of work

pub mod listeners;
pub mod phase;
pub mod process;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod unit_of_work;

pub use listeners::{ListenerRegistry, ListenerToken};
pub use phase::{Phase, Stage};
pub use process::{Process, ProcessBuilder};
pub use shutdown::Shutdown;
pub use unit_of_work::{UnitOfWork, WorkState};

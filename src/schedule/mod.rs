//! Schedule subsystem.
//!
//! # Data Flow
//! ```text
//! schedule file (text)
//!     → parser.rs (ScheduleParser: name + content → Schedule)
//!     → schedule.rs (immutable ordered actions, or invalid)
//!     → executor.rs (pre-schedule → actions until shutdown → post-schedule)
//! ```
//!
//! # Design Decisions
//! - Unreadable files and invalid schedules are skipped, never fatal
//! - Shutdown is checked before every action, not just at entry
//! - pre-schedule and post-schedule always fire as a pair
//! - Action failures propagate; the caller's unit of work reports the abort

pub mod executor;
pub mod parser;
pub mod schedule;

pub use executor::{ScheduleExecutor, ScheduleOutcome};
pub use parser::{ActionCatalog, ScheduleParser};
pub use schedule::{Action, ActionResult, Schedule};

//! Startup orchestration.
//!
//! # Responsibilities
//! - Fire the startup listeners
//! - Load domain modules, then the process module
//! - Run initialisation and the pre/post-init schedules
//! - Install signal handlers once everything else is in place
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Steps run in order on the caller's thread, never concurrently
//! - Signal handlers go in last so an early Ctrl-C keeps its default action

use crate::error::ProcessResult;
use crate::lifecycle::process::Process;

/// Drive a freshly built process through the whole startup sequence.
pub fn start(process: &mut Process) -> ProcessResult<()> {
    process.run_startup()?;

    let report = process.load_modules()?;
    if !report.loaded.is_empty() {
        tracing::info!(modules = report.loaded.len(), passes = report.passes, "Modules ready");
    }

    process.initialise()?;
    process.run_schedules()?;
    process.end_initialisation()?;
    process.end_startup()
}

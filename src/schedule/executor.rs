//! Schedule execution.

use std::borrow::Cow;
use std::path::Path;

use crate::error::{ProcessError, ProcessResult};
use crate::lifecycle::listeners::ListenerRegistry;
use crate::lifecycle::phase::Phase;
use crate::lifecycle::shutdown::Shutdown;
use crate::schedule::parser::ScheduleParser;
use crate::schedule::schedule::Schedule;

/// How a schedule run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Every action ran.
    Completed { ran: usize },
    /// Shutdown was observed before the last action.
    Interrupted { ran: usize },
    /// Nothing ran: file unreadable, schedule invalid, or shutdown already
    /// requested before the file was read.
    Skipped,
}

/// Runs schedules against the process listeners and shutdown flag.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleExecutor<'a> {
    listeners: &'a ListenerRegistry,
    shutdown: &'a Shutdown,
}

impl<'a> ScheduleExecutor<'a> {
    pub fn new(listeners: &'a ListenerRegistry, shutdown: &'a Shutdown) -> Self {
        Self { listeners, shutdown }
    }

    /// Run every action in order until shutdown is requested.
    ///
    /// `pre-schedule` and `post-schedule` fire as a pair whatever happens to
    /// the actions, including a failing action, whose error is returned
    /// after `post-schedule` has fired.
    pub fn run(&self, schedule: &Schedule) -> ProcessResult<ScheduleOutcome> {
        self.listeners.fire(Phase::PreSchedule);

        let mut ran = 0;
        let mut failure = None;
        let mut interrupted = false;

        for (index, action) in schedule.actions().iter().enumerate() {
            if self.shutdown.is_requested() {
                interrupted = true;
                break;
            }
            tracing::debug!(schedule = schedule.source_name(), index, action = action.name(), "Running action");
            if let Err(source) = action.invoke() {
                failure = Some(ProcessError::ActionFailed {
                    schedule: schedule.source_name().to_string(),
                    index,
                    source,
                });
                break;
            }
            ran += 1;
        }

        self.listeners.fire(Phase::PostSchedule);

        if let Some(err) = failure {
            return Err(err);
        }
        if interrupted {
            tracing::info!(
                schedule = schedule.source_name(),
                ran,
                skipped = schedule.len() - ran,
                "Schedule interrupted by shutdown"
            );
            return Ok(ScheduleOutcome::Interrupted { ran });
        }
        Ok(ScheduleOutcome::Completed { ran })
    }

    /// Read, parse and run a schedule file.
    ///
    /// An unreadable file is reported as a warning and skipped; an invalid
    /// schedule is skipped without firing any listener.
    pub fn run_from_file(
        &self,
        path: &Path,
        parser: &dyn ScheduleParser,
    ) -> ProcessResult<ScheduleOutcome> {
        match self.load_file(path, parser) {
            Some(schedule) => self.run(&schedule),
            None => Ok(ScheduleOutcome::Skipped),
        }
    }

    /// The checks `run_from_file` makes before running anything: shutdown,
    /// readability, validity. `None` means skip; nothing has fired.
    ///
    /// Content that is not UTF-8 is decoded lossily and left to the parser.
    pub fn load_file(&self, path: &Path, parser: &dyn ScheduleParser) -> Option<Schedule> {
        if self.shutdown.is_requested() {
            return None;
        }

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(source) => {
                let err = ProcessError::ScheduleFileUnreadable {
                    path: path.to_path_buf(),
                    source,
                };
                tracing::warn!(error = %err, "Skipping schedule");
                return None;
            }
        };
        let content = String::from_utf8_lossy(&bytes);
        if matches!(content, Cow::Owned(_)) {
            tracing::warn!(path = %path.display(), "Schedule file is not valid UTF-8; invalid bytes replaced");
        }

        let schedule = parser.parse(&path.display().to_string(), &content);
        if !schedule.is_valid() {
            let err = ProcessError::InvalidSchedule {
                name: schedule.source_name().to_string(),
            };
            tracing::debug!(error = %err, "Skipping schedule");
            return None;
        }
        Some(schedule)
    }
}

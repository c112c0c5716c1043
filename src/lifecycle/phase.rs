//! Lifecycle phases and the controller's stage machine.
//!
//! # Stages
//! ```text
//! Constructed → Starting → Initialising → Schedules → Initialised
//!     → Started → Running → ShuttingDown → Terminated
//! ```
//! `Initialising → Initialised` is allowed when no schedules are run, and
//! every live stage may jump to `ShuttingDown` (forced termination).

use std::fmt;

/// Named points in the lifecycle that carry their own listener set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Starting,
    Initialising,
    Initialised,
    Started,
    PreSchedules,
    PostSchedules,
    PreSchedule,
    PostSchedule,
    NextSchedulePhase,
    ThreadStarted,
    ThreadCompleting,
    ThreadCompleted,
    ThreadAborted,
    Shutdown,
}

impl Phase {
    pub const COUNT: usize = 14;

    pub const ALL: [Phase; Phase::COUNT] = [
        Phase::Starting,
        Phase::Initialising,
        Phase::Initialised,
        Phase::Started,
        Phase::PreSchedules,
        Phase::PostSchedules,
        Phase::PreSchedule,
        Phase::PostSchedule,
        Phase::NextSchedulePhase,
        Phase::ThreadStarted,
        Phase::ThreadCompleting,
        Phase::ThreadCompleted,
        Phase::ThreadAborted,
        Phase::Shutdown,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Starting => "starting",
            Phase::Initialising => "initialising",
            Phase::Initialised => "initialised",
            Phase::Started => "started",
            Phase::PreSchedules => "pre-schedules",
            Phase::PostSchedules => "post-schedules",
            Phase::PreSchedule => "pre-schedule",
            Phase::PostSchedule => "post-schedule",
            Phase::NextSchedulePhase => "next-schedule-phase",
            Phase::ThreadStarted => "thread-started",
            Phase::ThreadCompleting => "thread-completing",
            Phase::ThreadCompleted => "thread-completed",
            Phase::ThreadAborted => "thread-aborted",
            Phase::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the phase controller currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Built, nothing run yet.
    Constructed,
    /// Startup listeners fired; modules may be loaded.
    Starting,
    /// Initialisation unit of work has run.
    Initialising,
    /// Pre/post-init schedules have run.
    Schedules,
    Initialised,
    /// Signal handlers are in place.
    Started,
    /// Inside the event loop.
    Running,
    ShuttingDown,
    Terminated,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::ShuttingDown | Stage::Terminated)
    }

    pub(crate) fn can_transition_to(self, next: Stage) -> bool {
        use Stage::*;
        match (self, next) {
            (ShuttingDown, Terminated) => true,
            (from, ShuttingDown) => !from.is_terminal(),
            (from, to) => matches!(
                (from, to),
                (Constructed, Starting)
                    | (Starting, Initialising)
                    | (Initialising, Schedules)
                    | (Initialising, Initialised)
                    | (Schedules, Initialised)
                    | (Initialised, Started)
                    | (Started, Running)
            ),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Constructed => write!(f, "constructed"),
            Stage::Starting => write!(f, "starting"),
            Stage::Initialising => write!(f, "initialising"),
            Stage::Schedules => write!(f, "schedules"),
            Stage::Initialised => write!(f, "initialised"),
            Stage::Started => write!(f, "started"),
            Stage::Running => write!(f, "running"),
            Stage::ShuttingDown => write!(f, "shutting-down"),
            Stage::Terminated => write!(f, "terminated"),
        }
    }
}

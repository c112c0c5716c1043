//! Error taxonomy for the process supervisor.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::lifecycle::phase::Stage;

/// Boxed error returned by scheduled actions and service bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A domain module that never loaded, with the last error seen for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFailure {
    pub module: String,
    pub reason: String,
}

impl std::fmt::Display for ModuleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.module, self.reason)
    }
}

/// Errors raised by the lifecycle core.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Lookup by a domain id that was never assigned.
    #[error("Invalid Domain Id: {0}")]
    UnknownDomainId(u32),

    /// Lookup by a domain name that was never registered.
    #[error("Invalid Domain Name: {0}")]
    UnknownDomainName(String),

    /// The fixed-point loader stalled with modules still unresolved.
    #[error("failed to load domain metadata library(s) : {}", render_failures(.failures))]
    ModuleLoadFailure { failures: Vec<ModuleFailure> },

    /// The process-level module could not be opened.
    #[error("failed to load process metadata library {module} : {reason}")]
    ProcessModuleLoadFailure { module: String, reason: String },

    /// A schedule file could not be read. Non-fatal.
    #[error("Schedule file '{}' not found. Ignored.", .path.display())]
    ScheduleFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The parser marked a schedule invalid. Non-fatal.
    #[error("Schedule '{name}' is invalid. Ignored.")]
    InvalidSchedule { name: String },

    /// A scheduled action returned an error.
    #[error("action {index} of schedule '{schedule}' failed: {source}")]
    ActionFailed {
        schedule: String,
        index: usize,
        #[source]
        source: BoxError,
    },

    /// A service body run under `Process::run_service` failed.
    #[error("service failed: {source}")]
    ServiceFailed {
        #[source]
        source: BoxError,
    },

    /// A lifecycle transition was requested out of order.
    #[error("cannot move from {from} to {to}")]
    PhaseOrder { from: Stage, to: Stage },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The event loop runtime could not be created.
    #[error("event loop error: {0}")]
    EventLoop(#[source] std::io::Error),

    #[error("failed to install signal handler: {0}")]
    SignalInstall(String),
}

fn render_failures(failures: &[ModuleFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type for lifecycle operations.
pub type ProcessResult<T> = Result<T, ProcessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_failure_lists_every_module() {
        let err = ProcessError::ModuleLoadFailure {
            failures: vec![
                ModuleFailure { module: "libA_metadata.so".into(), reason: "undefined symbol".into() },
                ModuleFailure { module: "libB_metadata.so".into(), reason: "no such file".into() },
            ],
        };
        let text = err.to_string();
        assert!(text.contains("libA_metadata.so: undefined symbol"));
        assert!(text.contains("libB_metadata.so: no such file"));
    }

    #[test]
    fn unknown_domain_display() {
        assert_eq!(
            ProcessError::UnknownDomainName("Audit".into()).to_string(),
            "Invalid Domain Name: Audit"
        );
        assert_eq!(ProcessError::UnknownDomainId(7).to_string(), "Invalid Domain Id: 7");
    }
}

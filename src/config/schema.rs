//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! supervisor. All types derive Serde traits for deserialization from
//! config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the process supervisor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Process identity and start mode.
    pub process: ProcessConfig,

    /// Domains registered before modules are loaded.
    pub domains: DomainsConfig,

    /// Domain module loading.
    pub modules: ModulesConfig,

    /// Schedule files run around initialisation.
    pub schedules: SchedulesConfig,

    /// Event loop tuning.
    pub event_loop: EventLoopConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Process identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Project the generated application was built from. Also names the
    /// process-level module.
    pub project_name: String,

    /// Process name override. Falls back to `project_name`.
    pub name: Option<String>,

    /// Start without restoring persisted state.
    pub cold_start: bool,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            project_name: "process".to_string(),
            name: None,
            cold_start: false,
        }
    }
}

/// Domains known before any module is loaded.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DomainsConfig {
    /// Domains present only through their interface.
    pub interfaces: Vec<String>,

    /// Domains whose full implementation runs in this process.
    pub implementations: Vec<String>,
}

/// Module loading configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Load domain modules at startup.
    pub enabled: bool,

    /// Base library name appended to every module (`<domain>_<lib_name>`).
    pub lib_name: String,

    /// Inserted after the domain name for interface-only domains.
    pub interface_suffix: String,

    /// Directory prefixed to every module file name.
    pub search_path: Option<PathBuf>,

    /// Load `<project_name>_<lib_name>` after the domain modules.
    pub load_project_lib: bool,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lib_name: "metadata".to_string(),
            interface_suffix: "_if".to_string(),
            search_path: None,
            load_project_lib: true,
        }
    }
}

/// Schedule files, run in listed order.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SchedulesConfig {
    /// Run before the next-schedule-phase hook.
    pub pre_init: Vec<PathBuf>,

    /// Run after the next-schedule-phase hook.
    pub post_init: Vec<PathBuf>,
}

/// Event loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventLoopConfig {
    /// How often the loop checks for a signal-delivered shutdown request.
    pub shutdown_poll_ms: u64,

    /// Keep running while idle until shutdown is requested.
    pub keep_alive: bool,
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            shutdown_poll_ms: 100,
            keep_alive: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}

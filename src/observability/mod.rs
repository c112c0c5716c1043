//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events on stderr)
//!     → metrics.rs (Prometheus exporter)
//!
//! Units of work report to:
//!     → monitor.rs (ProcessMonitor: started/completing/completed/aborted/pause)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON optional) for machine parsing
//! - Unit-of-work ids flow through log fields
//! - Metrics are cheap and a no-op until an exporter is installed

pub mod logging;
pub mod metrics;
pub mod monitor;

pub use monitor::{MetricsMonitor, ProcessMonitor};

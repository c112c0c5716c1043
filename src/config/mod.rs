//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → cli.rs (command-line overrides: name, cold start, schedules)
//!     → validation.rs (semantic checks)
//!     → SupervisorConfig (validated, immutable)
//!     → handed to Process::builder()
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the process is built
//! - All fields have defaults to allow minimal (or no) config files
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::SupervisorConfig;
pub use schema::ProcessConfig;
pub use schema::DomainsConfig;
pub use schema::ModulesConfig;
pub use schema::SchedulesConfig;
pub use schema::EventLoopConfig;
pub use schema::ObservabilityConfig;

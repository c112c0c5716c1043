//! Domain registry subsystem.
//!
//! # Data Flow
//! ```text
//! config [domains] / generated code
//!     → registry.rs (name → dense id)
//!     → modules::loader (one module per domain)
//!     → collaborators look domains up by id or name
//! ```
//!
//! # Design Decisions
//! - Ids are dense and assigned in first-registration order
//! - Registration is idempotent by name
//! - Domains are never removed

pub mod registry;

pub use registry::{Domain, DomainId, DomainRegistry};

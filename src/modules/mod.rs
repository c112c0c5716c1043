//! Domain module loading subsystem.
//!
//! # Data Flow
//! ```text
//! DomainRegistry
//!     → loader.rs ModuleNaming (domain[+suffix]_lib → platform file name)
//!     → loader.rs fixed-point passes over the candidate set
//!     → dylib.rs opens each file RTLD_NOW | RTLD_GLOBAL
//!     → process-level module last
//! ```
//!
//! # Design Decisions
//! - No dependency graph: retry failed modules while each pass fails fewer
//! - A pass that fails as many modules as the previous one is a stall
//! - The process module is only attempted once every domain module is in
//! - Runs once at startup; any failure is fatal

pub mod dylib;
pub mod loader;

pub use dylib::DynamicLibraryOpener;
pub use loader::{LoadReport, ModuleLoader, ModuleNaming, ModuleOpener};

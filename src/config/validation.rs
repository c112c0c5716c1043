//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check names used to build module file names are usable
//! - Validate value ranges (poll interval > 0, metrics address parses)
//! - Detect conflicting domain declarations
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SupervisorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::SupervisorConfig;

/// One semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("process.project_name must not be empty")]
    EmptyProjectName,

    #[error("modules.lib_name must not be empty")]
    EmptyLibName,

    #[error("event_loop.shutdown_poll_ms must be greater than zero")]
    ZeroPollInterval,

    #[error("domain '{0}' is declared more than once")]
    DuplicateDomain(String),

    #[error("domain name must not be empty")]
    EmptyDomainName,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

pub fn validate_config(config: &SupervisorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.process.project_name.trim().is_empty() {
        errors.push(ValidationError::EmptyProjectName);
    }
    if config.modules.lib_name.trim().is_empty() {
        errors.push(ValidationError::EmptyLibName);
    }
    if config.event_loop.shutdown_poll_ms == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    let mut seen = HashSet::new();
    let declared = config
        .domains
        .interfaces
        .iter()
        .chain(config.domains.implementations.iter());
    for name in declared {
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyDomainName);
        } else if !seen.insert(name.as_str()) {
            errors.push(ValidationError::DuplicateDomain(name.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Name → id table for the application's domains.

use std::collections::HashMap;

use crate::error::{ProcessError, ProcessResult};

/// Dense, zero-based domain identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainId(pub u32);

impl From<u32> for DomainId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<DomainId> for u32 {
    fn from(id: DomainId) -> Self {
        id.0
    }
}

impl std::fmt::Display for DomainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "domain-{}", self.0)
    }
}

/// A named partition of the application's object model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    id: DomainId,
    name: String,
    is_interface: bool,
}

impl Domain {
    pub fn id(&self) -> DomainId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when only the domain's interface is present in this process.
    pub fn is_interface(&self) -> bool {
        self.is_interface
    }
}

/// Registry of every domain known to the process.
///
/// Only grows. Lookups by id index straight into the backing vector.
#[derive(Debug, Default)]
pub struct DomainRegistry {
    domains: Vec<Domain>,
    lookup: HashMap<String, DomainId>,
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an externally supplied domain (interface only).
    pub fn register(&mut self, name: &str) -> &Domain {
        self.register_with(name, true)
    }

    /// Register a domain, returning the existing entry if `name` is known.
    ///
    /// `is_interface` only applies to a new registration.
    pub fn register_with(&mut self, name: &str, is_interface: bool) -> &Domain {
        if let Some(id) = self.lookup.get(name) {
            return &self.domains[id.0 as usize];
        }

        let id = DomainId(self.domains.len() as u32);
        self.domains.push(Domain {
            id,
            name: name.to_string(),
            is_interface,
        });
        self.lookup.insert(name.to_string(), id);
        tracing::debug!(domain = name, id = id.0, is_interface, "Domain registered");
        &self.domains[id.0 as usize]
    }

    pub fn get(&self, id: DomainId) -> ProcessResult<&Domain> {
        self.domains
            .get(id.0 as usize)
            .ok_or(ProcessError::UnknownDomainId(id.0))
    }

    pub fn get_by_name(&self, name: &str) -> ProcessResult<&Domain> {
        self.lookup
            .get(name)
            .map(|id| &self.domains[id.0 as usize])
            .ok_or_else(|| ProcessError::UnknownDomainName(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Domains in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Domain> {
        self.domains.iter()
    }
}

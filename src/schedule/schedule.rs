//! Parsed schedules and their actions.

use std::sync::Arc;

use crate::error::BoxError;

/// Result of running one action.
pub type ActionResult = Result<(), BoxError>;

/// An opaque zero-argument step of a schedule.
#[derive(Clone)]
pub struct Action {
    name: String,
    body: Arc<dyn Fn() -> ActionResult + Send + Sync>,
}

impl Action {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn() -> ActionResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(&self) -> ActionResult {
        (self.body)()
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Action").field(&self.name).finish()
    }
}

/// An ordered, immutable list of actions from one schedule source.
#[derive(Debug, Clone)]
pub struct Schedule {
    source_name: String,
    actions: Vec<Action>,
    valid: bool,
}

impl Schedule {
    pub fn new(source_name: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            source_name: source_name.into(),
            actions,
            valid: true,
        }
    }

    /// A schedule the parser rejected. Contributes no actions.
    pub fn invalid(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            actions: Vec::new(),
            valid: false,
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

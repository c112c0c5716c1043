//! Schedule parsing.
//!
//! The parser is a collaborator: the core only needs
//! `parse(name, content) → Schedule`. [`ActionCatalog`] is the built-in
//! implementation, resolving one action name per line:
//!
//! ```text
//! # comment
//! load_fixtures accounts.csv
//! log ready
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::schedule::schedule::{Action, ActionResult, Schedule};

/// Turns schedule file content into a [`Schedule`].
pub trait ScheduleParser: Send + Sync {
    fn parse(&self, name: &str, content: &str) -> Schedule;
}

impl<F> ScheduleParser for F
where
    F: Fn(&str, &str) -> Schedule + Send + Sync,
{
    fn parse(&self, name: &str, content: &str) -> Schedule {
        self(name, content)
    }
}

type ActionBody = Arc<dyn Fn(&[String]) -> ActionResult + Send + Sync>;

/// Named actions a schedule file may refer to.
///
/// Each non-blank line that does not start with `#` is
/// `<action> [arg ...]`; the arguments are bound into the resulting
/// zero-argument [`Action`]. An unknown action name invalidates the whole
/// schedule.
#[derive(Clone, Default)]
pub struct ActionCatalog {
    actions: HashMap<String, ActionBody>,
}

impl ActionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: Fn(&[String]) -> ActionResult + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(body));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl ScheduleParser for ActionCatalog {
    fn parse(&self, name: &str, content: &str) -> Schedule {
        let mut actions = Vec::new();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut words = line.split_whitespace();
            let Some(action) = words.next() else { continue };
            let Some(body) = self.actions.get(action) else {
                tracing::warn!(
                    schedule = name,
                    line = number + 1,
                    action,
                    "Unknown schedule action"
                );
                return Schedule::invalid(name);
            };

            let args: Vec<String> = words.map(str::to_string).collect();
            let body = Arc::clone(body);
            actions.push(Action::new(line, move || body(&args)));
        }

        Schedule::new(name, actions)
    }
}

impl std::fmt::Debug for ActionCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.actions.keys().collect();
        names.sort();
        f.debug_struct("ActionCatalog").field("actions", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn catalog(log: &Arc<Mutex<Vec<String>>>) -> ActionCatalog {
        let mut catalog = ActionCatalog::new();
        let sink = Arc::clone(log);
        catalog.register("say", move |args| {
            sink.lock().unwrap().push(args.join(" "));
            Ok(())
        });
        catalog
    }

    #[test]
    fn parses_lines_in_order_with_arguments() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let schedule = catalog(&log).parse("boot.sch", "# greeting\nsay hello world\n\n  say again\n");

        assert!(schedule.is_valid());
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.actions()[0].name(), "say hello world");

        for action in schedule.actions() {
            action.invoke().unwrap();
        }
        assert_eq!(*log.lock().unwrap(), vec!["hello world", "again"]);
    }

    #[test]
    fn unknown_action_invalidates_schedule() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let schedule = catalog(&log).parse("boot.sch", "say hi\nreboot\n");
        assert!(!schedule.is_valid());
        assert!(schedule.is_empty());
    }

    #[test]
    fn empty_content_is_a_valid_empty_schedule() {
        let schedule = ActionCatalog::new().parse("empty.sch", "\n# nothing\n");
        assert!(schedule.is_valid());
        assert!(schedule.is_empty());
    }

    #[test]
    fn closures_are_parsers() {
        let parser = |name: &str, _: &str| Schedule::invalid(name);
        assert!(!parser.parse("x", "").is_valid());
    }
}

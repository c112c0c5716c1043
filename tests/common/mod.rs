//! Shared utilities for lifecycle integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::{Arc, Mutex};

use process_supervisor::config::SupervisorConfig;
use process_supervisor::lifecycle::{Phase, Process};
use process_supervisor::modules::ModuleOpener;
use process_supervisor::observability::monitor::ProcessMonitor;

/// Monitor that records every notification by name.
#[derive(Default)]
pub struct RecordingMonitor {
    events: Mutex<Vec<&'static str>>,
}

impl RecordingMonitor {
    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events.lock().unwrap().iter().filter(|e| **e == event).count()
    }

    fn push(&self, event: &'static str) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProcessMonitor for RecordingMonitor {
    fn thread_started(&self) {
        self.push("started");
    }
    fn thread_completing(&self) {
        self.push("completing");
    }
    fn thread_completed(&self) {
        self.push("completed");
    }
    fn thread_aborted(&self) {
        self.push("aborted");
    }
    fn pause_requested(&self) {
        self.push("pause");
    }
}

/// In-memory module opener. A module opens once all of its declared
/// dependencies have opened; modules listed as missing never open.
#[derive(Clone, Default)]
pub struct FakeOpener {
    deps: HashMap<String, Vec<String>>,
    missing: HashSet<String>,
    state: Arc<Mutex<OpenerState>>,
}

#[derive(Default)]
pub struct OpenerState {
    pub attempts: Vec<String>,
    pub loaded: Vec<String>,
}

impl FakeOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depends(mut self, module: &str, on: &[&str]) -> Self {
        self.deps
            .insert(module.to_string(), on.iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn missing(mut self, module: &str) -> Self {
        self.missing.insert(module.to_string());
        self
    }

    pub fn attempts(&self) -> Vec<String> {
        self.state.lock().unwrap().attempts.clone()
    }

    pub fn loaded(&self) -> Vec<String> {
        self.state.lock().unwrap().loaded.clone()
    }
}

impl ModuleOpener for FakeOpener {
    fn open(&mut self, module: &str) -> Result<(), String> {
        let mut state = self.state.lock().unwrap();
        state.attempts.push(module.to_string());

        if self.missing.contains(module) {
            return Err(format!("{module}: cannot open shared object file"));
        }
        let unresolved = self
            .deps
            .get(module)
            .into_iter()
            .flatten()
            .find(|dep| !state.loaded.contains(*dep));
        if let Some(dep) = unresolved {
            return Err(format!("undefined symbol from {dep}"));
        }
        state.loaded.push(module.to_string());
        Ok(())
    }
}

/// A process with signals left alone and the given opener.
pub fn build_process(
    config: SupervisorConfig,
    monitor: Arc<RecordingMonitor>,
    opener: FakeOpener,
) -> Process {
    Process::builder()
        .config(config)
        .monitor(monitor)
        .opener(Box::new(opener))
        .install_signal_handlers(false)
        .build()
        .unwrap()
}

/// Record every firing of `phases` into a shared log, by phase name.
pub fn record_phases(process: &Process, phases: &[Phase]) -> Arc<Mutex<Vec<String>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for phase in phases {
        let sink = Arc::clone(&log);
        let phase = *phase;
        process
            .listeners()
            .register(phase, move || sink.lock().unwrap().push(phase.to_string()));
    }
    log
}

/// Write a schedule file that outlives the returned handle's scope.
pub fn schedule_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

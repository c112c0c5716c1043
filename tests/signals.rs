//! Signal-driven shutdown tests. Kept in their own binary so no other test
//! shares the process-wide signal dispositions.

#![cfg(unix)]

use std::sync::Arc;

use nix::sys::signal::{raise, Signal};

use process_supervisor::event_loop::LoopExit;
use process_supervisor::lifecycle::{signals, startup, Phase, Process, Shutdown};

mod common;

use common::{record_phases, FakeOpener};

#[test]
fn test_signal_requests_shutdown_and_main_loop_exits() {
    let shutdown = Arc::new(Shutdown::new());
    let installed = signals::install(&shutdown).unwrap();
    if installed != 2 {
        // The harness runs with SIGINT/SIGTERM already claimed; nothing to test.
        return;
    }

    raise(Signal::SIGTERM).unwrap();
    assert!(shutdown.is_requested());

    // The handler put the default dispositions back, so the process can
    // take them over again at the end of startup.
    let mut config = process_supervisor::SupervisorConfig::default();
    config.event_loop.shutdown_poll_ms = 10;
    let mut process = Process::builder()
        .config(config)
        .opener(Box::new(FakeOpener::new()))
        .build()
        .unwrap();
    let log = record_phases(&process, &[Phase::Started, Phase::Shutdown]);

    startup::start(&mut process).unwrap();
    assert!(!process.shutdown_requested());

    raise(Signal::SIGINT).unwrap();
    assert!(process.shutdown_requested());

    assert_eq!(process.main_loop().unwrap(), LoopExit::Shutdown);
    assert_eq!(*log.lock().unwrap(), vec!["started", "shutdown"]);
}

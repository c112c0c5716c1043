//! Process Lifecycle Supervisor (v1)
//!
//! Runs one domain-partitioned process through its lifecycle.
//!
//! # Architecture Overview
//!
//! ```text
//!   command line + TOML ──▶ config ──▶ Process::builder()
//!                                          │
//!                      ┌───────────────────┼───────────────────────┐
//!                      ▼                   ▼                       ▼
//!                 domain registry     module loader          listener registry
//!                      │             (fixed-point passes)          │
//!                      └──────────────────▶│◀──────────────────────┘
//!                                          ▼
//!                  startup: initialise → schedules → started
//!                                          │
//!                                          ▼
//!                  event loop (strand) ◀── post / timers / async completions
//!                                          │
//!                       SIGINT/SIGTERM ──▶ shutdown flag
//!                                          ▼
//!                             shutdown listeners, once
//! ```
//!
//! Schedules use the built-in action catalog:
//! - `log <message...>` writes the message at info level
//! - `shutdown` requests shutdown

use std::process::ExitCode;
use std::sync::{Arc, OnceLock};

use clap::Parser;

use process_supervisor::config::cli::CommandLine;
use process_supervisor::lifecycle::{startup, Process};
use process_supervisor::observability::{logging, metrics};
use process_supervisor::schedule::ActionCatalog;
use process_supervisor::Shutdown;

fn main() -> ExitCode {
    let cli = CommandLine::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("process-supervisor: {err}");
            return ExitCode::from(2);
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("process-supervisor v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(err) = metrics::init_metrics(addr) {
                    tracing::error!(error = %err, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Schedule actions run before the process exists; they reach the
    // shutdown flag through this slot once it is filled.
    let shutdown_slot: Arc<OnceLock<Arc<Shutdown>>> = Arc::new(OnceLock::new());
    let catalog = builtin_actions(Arc::clone(&shutdown_slot));

    let mut process = match Process::builder()
        .config(config)
        .parser(Arc::new(catalog))
        .build()
    {
        Ok(process) => process,
        Err(err) => {
            eprintln!("process-supervisor: {err}");
            return ExitCode::FAILURE;
        }
    };
    let _ = shutdown_slot.set(process.shutdown_handle());

    if let Err(err) = startup::start(&mut process) {
        tracing::error!(error = %err, "Startup failed");
        eprintln!("{err}");
        process.force_terminate(1);
    }

    let result = match cli.idle_secs {
        Some(secs) => {
            let exit = process.idle(secs);
            tracing::info!(?exit, "Idle period over");
            process.shutdown()
        }
        None => process.main_loop().map(|_| ()),
    };

    match result {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Shutdown failed");
            ExitCode::FAILURE
        }
    }
}

fn builtin_actions(shutdown: Arc<OnceLock<Arc<Shutdown>>>) -> ActionCatalog {
    let mut catalog = ActionCatalog::new();
    catalog.register("log", |args| {
        tracing::info!(target: "schedule", "{}", args.join(" "));
        Ok(())
    });
    catalog.register("shutdown", move |_| {
        if let Some(flag) = shutdown.get() {
            flag.request();
        }
        Ok(())
    });
    catalog
}

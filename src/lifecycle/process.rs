//! The process phase controller.
//!
//! One `Process` is built at the composition root and owns the domain
//! registry, listener registry, shutdown flag, event loop and module opener.
//! Every controller method runs on the caller's thread, which is the strand:
//! nothing here is re-entered concurrently.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::config::schema::SupervisorConfig;
use crate::domain::{Domain, DomainId, DomainRegistry};
use crate::error::{ProcessError, ProcessResult};
use crate::event_loop::{EventLoop, EventLoopHandle, LoopExit};
use crate::lifecycle::listeners::ListenerRegistry;
use crate::lifecycle::phase::{Phase, Stage};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::lifecycle::unit_of_work::UnitOfWork;
use crate::modules::{DynamicLibraryOpener, LoadReport, ModuleLoader, ModuleNaming, ModuleOpener};
use crate::observability::monitor::{MetricsMonitor, ProcessMonitor};
use crate::schedule::{ActionCatalog, ActionResult, Schedule, ScheduleExecutor, ScheduleOutcome, ScheduleParser};

/// Builder for [`Process`].
pub struct ProcessBuilder {
    config: SupervisorConfig,
    monitor: Arc<dyn ProcessMonitor>,
    parser: Arc<dyn ScheduleParser>,
    opener: Box<dyn ModuleOpener>,
    install_signal_handlers: bool,
}

impl ProcessBuilder {
    fn new() -> Self {
        Self {
            config: SupervisorConfig::default(),
            monitor: Arc::new(MetricsMonitor),
            parser: Arc::new(ActionCatalog::new()),
            opener: Box::new(DynamicLibraryOpener::new()),
            install_signal_handlers: true,
        }
    }

    pub fn config(mut self, config: SupervisorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn monitor(mut self, monitor: Arc<dyn ProcessMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn parser(mut self, parser: Arc<dyn ScheduleParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn opener(mut self, opener: Box<dyn ModuleOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Whether `end_startup` takes over SIGINT/SIGTERM. Defaults to true.
    pub fn install_signal_handlers(mut self, install: bool) -> Self {
        self.install_signal_handlers = install;
        self
    }

    /// Create the event loop and register the configured domains.
    pub fn build(self) -> ProcessResult<Process> {
        let event_loop = EventLoop::new(&self.config.event_loop)?;

        let mut domains = DomainRegistry::new();
        for name in &self.config.domains.interfaces {
            domains.register_with(name, true);
        }
        for name in &self.config.domains.implementations {
            domains.register_with(name, false);
        }

        tracing::debug!(
            project = %self.config.process.project_name,
            domains = domains.len(),
            "Process constructed"
        );

        Ok(Process {
            config: self.config,
            name: OnceLock::new(),
            stage: Stage::Constructed,
            shutdown: Arc::new(Shutdown::new()),
            domains,
            listeners: Arc::new(ListenerRegistry::new()),
            monitor: self.monitor,
            parser: self.parser,
            opener: self.opener,
            event_loop,
            install_signal_handlers: self.install_signal_handlers,
        })
    }
}

/// Lifecycle controller for the whole program.
pub struct Process {
    config: SupervisorConfig,
    name: OnceLock<String>,
    stage: Stage,
    shutdown: Arc<Shutdown>,
    domains: DomainRegistry,
    listeners: Arc<ListenerRegistry>,
    monitor: Arc<dyn ProcessMonitor>,
    parser: Arc<dyn ScheduleParser>,
    opener: Box<dyn ModuleOpener>,
    event_loop: EventLoop,
    install_signal_handlers: bool,
}

impl Process {
    pub fn builder() -> ProcessBuilder {
        ProcessBuilder::new()
    }

    // --- Identity ---

    /// The process name: the configured override, else the project name.
    /// Resolved on first use.
    pub fn name(&self) -> &str {
        self.name.get_or_init(|| {
            self.config
                .process
                .name
                .clone()
                .unwrap_or_else(|| self.config.process.project_name.clone())
        })
    }

    pub fn project_name(&self) -> &str {
        &self.config.process.project_name
    }

    pub fn cold_start(&self) -> bool {
        self.config.process.cold_start
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    // --- Domains ---

    pub fn register_domain(&mut self, name: &str) -> &Domain {
        self.domains.register(name)
    }

    pub fn register_domain_with(&mut self, name: &str, is_interface: bool) -> &Domain {
        self.domains.register_with(name, is_interface)
    }

    pub fn domain(&self, id: DomainId) -> ProcessResult<&Domain> {
        self.domains.get(id)
    }

    pub fn domain_by_name(&self, name: &str) -> ProcessResult<&Domain> {
        self.domains.get_by_name(name)
    }

    pub fn domains(&self) -> &DomainRegistry {
        &self.domains
    }

    // --- Collaborator access ---

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn shutdown_handle(&self) -> Arc<Shutdown> {
        Arc::clone(&self.shutdown)
    }

    pub fn event_loop_handle(&self) -> EventLoopHandle {
        self.event_loop.handle()
    }

    /// Start a unit of work reported to this process's monitor and listeners.
    pub fn unit_of_work(&self, label: impl Into<String>) -> UnitOfWork {
        UnitOfWork::begin(label, Arc::clone(&self.listeners), Arc::clone(&self.monitor))
    }

    // --- Startup ---

    pub fn run_startup(&mut self) -> ProcessResult<()> {
        self.advance(Stage::Starting)?;
        self.listeners.fire(Phase::Starting);
        Ok(())
    }

    /// Load one module per registered domain, then the process module.
    pub fn load_modules(&mut self) -> ProcessResult<LoadReport> {
        let modules = &self.config.modules;
        if !modules.enabled {
            tracing::debug!("Module loading disabled");
            return Ok(LoadReport::default());
        }

        let naming = ModuleNaming::from_config(modules);
        let candidates = naming.candidates(&self.domains);
        let mut loader = ModuleLoader::new(self.opener.as_mut());
        let mut report = loader.load_domains(candidates)?;

        let project = &self.config.process.project_name;
        if modules.load_project_lib && !project.is_empty() {
            let module = naming.file_for(&naming.process_stem(project));
            loader.load_process(&module)?;
            report.loaded.push(module);
        }
        Ok(report)
    }

    /// Load only the process-level module, for statically linked domains.
    pub fn load_process_module(&mut self, lib_name: &str) -> ProcessResult<String> {
        let mut naming = ModuleNaming::new(lib_name, self.config.modules.interface_suffix.clone());
        if let Some(dir) = &self.config.modules.search_path {
            naming = naming.with_search_path(dir.clone());
        }
        let module = naming.file_for(&naming.process_stem(&self.config.process.project_name));
        ModuleLoader::new(self.opener.as_mut()).load_process(&module)?;
        Ok(module)
    }

    pub fn initialise(&mut self) -> ProcessResult<()> {
        self.advance(Stage::Initialising)?;
        let mut work = self.unit_of_work("Initialise Process");
        self.listeners.fire(Phase::Initialising);
        work.completing();
        work.complete();
        Ok(())
    }

    /// Pre-init schedules, the next-schedule-phase hook, post-init schedules.
    pub fn run_schedules(&mut self) -> ProcessResult<()> {
        self.advance(Stage::Schedules)?;
        self.listeners.fire(Phase::PreSchedules);

        let pre_init = self.config.schedules.pre_init.clone();
        self.run_schedule_files(&pre_init)?;

        self.start_next_schedule_phase();

        let post_init = self.config.schedules.post_init.clone();
        self.run_schedule_files(&post_init)?;

        self.listeners.fire(Phase::PostSchedules);
        Ok(())
    }

    pub fn start_next_schedule_phase(&self) {
        if self.shutdown.is_requested() {
            return;
        }
        let mut work = self.unit_of_work("Run NextSchedulePhase");
        self.listeners.fire(Phase::NextSchedulePhase);
        work.completing();
        work.complete();
    }

    /// Run one schedule as its own unit of work.
    pub fn run_schedule(&self, schedule: &Schedule) -> ProcessResult<ScheduleOutcome> {
        let mut work = self.unit_of_work(format!("Run Schedule {}", schedule.source_name()));
        let outcome = self.executor().run(schedule)?;
        work.completing();
        work.complete();
        Ok(outcome)
    }

    /// Read, parse and run a schedule file as its own unit of work.
    ///
    /// A file skipped for shutdown, unreadability or invalidity never
    /// starts a unit of work.
    pub fn run_schedule_file(&self, path: &std::path::Path) -> ProcessResult<ScheduleOutcome> {
        let executor = self.executor();
        let Some(schedule) = executor.load_file(path, self.parser.as_ref()) else {
            return Ok(ScheduleOutcome::Skipped);
        };
        let mut work = self.unit_of_work(format!("Run Schedule {}", path.display()));
        let outcome = executor.run(&schedule)?;
        work.completing();
        work.complete();
        Ok(outcome)
    }

    fn run_schedule_files(&self, paths: &[PathBuf]) -> ProcessResult<()> {
        for path in paths {
            self.run_schedule_file(path)?;
        }
        Ok(())
    }

    pub fn end_initialisation(&mut self) -> ProcessResult<()> {
        self.advance(Stage::Initialised)?;
        self.listeners.fire(Phase::Initialised);
        Ok(())
    }

    /// Fire `started`, then route SIGINT/SIGTERM to a shutdown request.
    pub fn end_startup(&mut self) -> ProcessResult<()> {
        self.advance(Stage::Started)?;
        self.listeners.fire(Phase::Started);
        if self.install_signal_handlers {
            let installed = signals::install(&self.shutdown)?;
            tracing::debug!(installed, "Signal handlers configured");
        }
        tracing::info!(process = self.name(), cold_start = self.cold_start(), "Process started");
        Ok(())
    }

    // --- Steady state ---

    /// Set the shutdown flag and wake the event loop. Safe to call any
    /// number of times from any thread.
    ///
    /// Not for signal handlers: this logs and takes the broadcast lock. A
    /// handler calls [`Shutdown::request_from_signal`] on
    /// [`Process::shutdown_handle`], a lock-free store the loop notices at
    /// its next poll tick.
    pub fn request_shutdown(&self) {
        self.shutdown.request();
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.is_requested()
    }

    /// Run the event loop to completion, then fire `shutdown` once.
    pub fn main_loop(&mut self) -> ProcessResult<LoopExit> {
        self.advance(Stage::Running)?;
        let exit = self.event_loop.run(&self.shutdown);
        tracing::info!(?exit, "Event loop finished");
        self.shutdown()?;
        Ok(exit)
    }

    /// Drive the event loop for at most `duration_secs` seconds.
    pub fn idle(&mut self, duration_secs: u64) -> LoopExit {
        self.event_loop
            .run_for(Duration::from_secs(duration_secs), &self.shutdown)
    }

    /// Tell the monitor the process is paused, then dispatch queued events once.
    pub fn pause(&mut self) {
        let mut work = self.unit_of_work("Pause");
        self.monitor.pause_requested();
        self.event_loop.poll();
        work.completing();
        work.complete();
    }

    /// Run one externally triggered service call as a unit of work, then
    /// dispatch whatever it queued.
    pub fn run_service<F>(&mut self, service: F) -> ProcessResult<()>
    where
        F: FnOnce() -> ActionResult,
    {
        let mut work = self.unit_of_work("Run Service");
        service().map_err(|source| ProcessError::ServiceFailed { source })?;
        self.event_loop.poll();
        work.completing();
        work.complete();
        Ok(())
    }

    // --- Shutdown ---

    /// Fire the `shutdown` listeners. Only the first call does anything.
    pub fn shutdown(&mut self) -> ProcessResult<()> {
        if self.stage.is_terminal() {
            return Ok(());
        }
        self.advance(Stage::ShuttingDown)?;
        self.shutdown.request();
        self.listeners.fire(Phase::Shutdown);
        self.advance(Stage::Terminated)?;
        tracing::info!(process = self.name(), "Process terminated");
        Ok(())
    }

    /// The shutdown half of [`Process::force_terminate`], without exiting.
    ///
    /// A panic from a shutdown listener is caught and handed back.
    pub fn terminate_shutdown(&mut self) -> std::thread::Result<ProcessResult<()>> {
        panic::catch_unwind(AssertUnwindSafe(|| self.shutdown()))
    }

    /// Run the shutdown path and exit with `code`.
    ///
    /// If a shutdown listener panics the panic is reported on stderr and
    /// resumed, so the process still dies non-gracefully.
    pub fn force_terminate(&mut self, code: i32) -> ! {
        match self.terminate_shutdown() {
            Ok(Ok(())) => std::process::exit(code),
            Ok(Err(err)) => {
                eprintln!("{err}");
                std::process::exit(code)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                eprintln!("{message}");
                tracing::error!(error = %message, "Shutdown failed during forced termination");
                panic::resume_unwind(payload)
            }
        }
    }

    fn advance(&mut self, to: Stage) -> ProcessResult<()> {
        if !self.stage.can_transition_to(to) {
            return Err(ProcessError::PhaseOrder {
                from: self.stage,
                to,
            });
        }
        tracing::debug!(from = %self.stage, to = %to, "Lifecycle transition");
        self.stage = to;
        Ok(())
    }

    fn executor(&self) -> ScheduleExecutor<'_> {
        ScheduleExecutor::new(&self.listeners, &self.shutdown)
    }
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("project", &self.config.process.project_name)
            .field("stage", &self.stage)
            .field("domains", &self.domains.len())
            .field("shutdown_requested", &self.shutdown.is_requested())
            .field("event_loop", &self.event_loop)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "shutdown panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct NoModules;

    impl ModuleOpener for NoModules {
        fn open(&mut self, _: &str) -> Result<(), String> {
            Ok(())
        }
    }

    fn process() -> Process {
        Process::builder()
            .opener(Box::new(NoModules))
            .install_signal_handlers(false)
            .build()
            .unwrap()
    }

    #[test]
    fn name_falls_back_to_project() {
        let mut config = SupervisorConfig::default();
        config.process.project_name = "accounts".into();
        let p = Process::builder().config(config.clone()).build().unwrap();
        assert_eq!(p.name(), "accounts");

        config.process.name = Some("accounts-2".into());
        let p = Process::builder().config(config).build().unwrap();
        assert_eq!(p.name(), "accounts-2");
    }

    #[test]
    fn configured_domains_are_registered_in_order() {
        let mut config = SupervisorConfig::default();
        config.domains.interfaces = vec!["Billing".into()];
        config.domains.implementations = vec!["Ledger".into()];
        let p = Process::builder().config(config).build().unwrap();

        let billing = p.domain_by_name("Billing").unwrap();
        assert_eq!(billing.id(), DomainId(0));
        assert!(billing.is_interface());
        assert!(!p.domain(DomainId(1)).unwrap().is_interface());
    }

    #[test]
    fn out_of_order_transition_is_rejected() {
        let mut p = process();
        let err = p.initialise().unwrap_err();
        assert!(matches!(
            err,
            ProcessError::PhaseOrder { from: Stage::Constructed, to: Stage::Initialising }
        ));
    }

    #[test]
    fn shutdown_listeners_fire_exactly_once() {
        let mut p = process();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        p.listeners().register(Phase::Shutdown, move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        p.shutdown().unwrap();
        p.shutdown().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(p.stage(), Stage::Terminated);
        assert!(p.shutdown_requested());
    }

    #[test]
    fn terminate_shutdown_hands_back_listener_panic() {
        let mut p = process();
        p.listeners().register(Phase::Shutdown, || panic!("flush failed"));

        let payload = p.terminate_shutdown().unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "flush failed");
    }

    #[test]
    fn pause_reports_to_monitor_and_drains_queue() {
        #[derive(Default)]
        struct Pauses(AtomicUsize, AtomicUsize);
        impl ProcessMonitor for Pauses {
            fn thread_started(&self) {}
            fn thread_completing(&self) {}
            fn thread_completed(&self) {
                self.1.fetch_add(1, Ordering::SeqCst);
            }
            fn thread_aborted(&self) {}
            fn pause_requested(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let monitor = Arc::new(Pauses::default());
        let mut p = Process::builder()
            .monitor(Arc::clone(&monitor) as Arc<dyn ProcessMonitor>)
            .opener(Box::new(NoModules))
            .build()
            .unwrap();

        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);
        p.event_loop_handle().post(move || {
            r.fetch_add(1, Ordering::SeqCst);
        });

        p.pause();
        assert_eq!(monitor.0.load(Ordering::SeqCst), 1);
        assert_eq!(monitor.1.load(Ordering::SeqCst), 1);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_service_aborts_its_unit() {
        let mut p = process();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        p.listeners().register(Phase::ThreadAborted, move || sink.lock().unwrap().push("aborted"));
        let sink = Arc::clone(&events);
        p.listeners().register(Phase::ThreadCompleted, move || sink.lock().unwrap().push("completed"));

        let err = p.run_service(|| Err("terminator unavailable".into())).unwrap_err();
        assert!(matches!(err, ProcessError::ServiceFailed { .. }));

        p.run_service(|| Ok(())).unwrap();
        assert_eq!(*events.lock().unwrap(), vec!["aborted", "completed"]);
    }

    #[test]
    fn signal_style_request_ends_main_loop() {
        let mut config = SupervisorConfig::default();
        config.event_loop.shutdown_poll_ms = 10;
        let mut p = Process::builder()
            .config(config)
            .opener(Box::new(NoModules))
            .install_signal_handlers(false)
            .build()
            .unwrap();
        p.run_startup().unwrap();
        p.initialise().unwrap();
        p.end_initialisation().unwrap();
        p.end_startup().unwrap();

        p.shutdown_handle().request_from_signal();
        assert!(p.shutdown_requested());
        assert_eq!(p.main_loop().unwrap(), LoopExit::Shutdown);
        assert_eq!(p.stage(), Stage::Terminated);
    }

    #[test]
    fn idle_returns_control_with_work_pending() {
        let mut p = process();
        p.event_loop_handle().post_after(Duration::from_secs(30), || {});
        assert_eq!(p.idle(0), LoopExit::TimedOut);
        assert_eq!(p.event_loop_handle().pending(), 1);
    }

    #[test]
    fn disabled_modules_load_nothing() {
        let mut config = SupervisorConfig::default();
        config.modules.enabled = false;
        config.domains.interfaces = vec!["Billing".into()];
        let mut p = Process::builder().config(config).build().unwrap();
        assert_eq!(p.load_modules().unwrap(), LoadReport::default());
    }
}

//! Process monitor collaborator.
//!
//! Every unit of work reports its start and exactly one of completed/aborted
//! here. Implementations must not panic.

/// Receives unit-of-work notifications.
pub trait ProcessMonitor: Send + Sync {
    fn thread_started(&self);
    fn thread_completing(&self);
    fn thread_completed(&self);
    fn thread_aborted(&self);
    fn pause_requested(&self);
}

/// Default monitor: Prometheus counters plus debug events.
///
/// Recording without an installed exporter is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsMonitor;

impl ProcessMonitor for MetricsMonitor {
    fn thread_started(&self) {
        metrics::counter!("process_units_started_total").increment(1);
        metrics::gauge!("process_units_in_progress").increment(1.0);
    }

    fn thread_completing(&self) {
        metrics::counter!("process_units_completing_total").increment(1);
    }

    fn thread_completed(&self) {
        metrics::counter!("process_units_completed_total").increment(1);
        metrics::gauge!("process_units_in_progress").decrement(1.0);
    }

    fn thread_aborted(&self) {
        metrics::counter!("process_units_aborted_total").increment(1);
        metrics::gauge!("process_units_in_progress").decrement(1.0);
    }

    fn pause_requested(&self) {
        tracing::debug!("Pause requested");
        metrics::counter!("process_pause_requests_total").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_monitor_without_recorder_is_silent() {
        let monitor = MetricsMonitor;
        monitor.thread_started();
        monitor.thread_completing();
        monitor.thread_completed();
        monitor.thread_aborted();
        monitor.pause_requested();
    }
}

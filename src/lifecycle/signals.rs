//! OS signal handling.
//!
//! # Responsibilities
//! - Route SIGINT/SIGTERM to a cooperative shutdown request
//! - Restore the default disposition on first delivery so a second signal
//!   kills the process outright
//! - Leave alone any disposition the embedding environment already chose

use std::sync::Arc;

use crate::error::ProcessResult;
use crate::lifecycle::shutdown::Shutdown;

#[cfg(unix)]
mod imp {
    use std::sync::atomic::{AtomicPtr, Ordering};
    use std::sync::Arc;

    use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

    use crate::error::{ProcessError, ProcessResult};
    use crate::lifecycle::shutdown::Shutdown;

    /// Target of the handler. Each install leaks one strong reference, so a
    /// handler running concurrently with a re-install never sees a freed flag.
    static TARGET: AtomicPtr<Shutdown> = AtomicPtr::new(std::ptr::null_mut());

    const SIGNALS: [Signal; 2] = [Signal::SIGINT, Signal::SIGTERM];

    extern "C" fn quit_with_cleanup(_: std::os::raw::c_int) {
        for sig in SIGNALS {
            // SAFETY: sigaction(2) is async-signal-safe.
            let _ = unsafe { signal::signal(sig, SigHandler::SigDfl) };
        }
        let target = TARGET.load(Ordering::SeqCst);
        if !target.is_null() {
            // SAFETY: points at a leaked Arc<Shutdown>, never freed.
            unsafe { (*target).request_from_signal() };
        }
    }

    pub fn install(shutdown: &Arc<Shutdown>) -> ProcessResult<usize> {
        let raw = Arc::into_raw(Arc::clone(shutdown)) as *mut Shutdown;
        TARGET.store(raw, Ordering::SeqCst);

        let action = SigAction::new(
            SigHandler::Handler(quit_with_cleanup),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );

        let mut installed = 0;
        for sig in SIGNALS {
            // SAFETY: the handler only performs async-signal-safe work.
            let previous = unsafe { signal::sigaction(sig, &action) }
                .map_err(|e| ProcessError::SignalInstall(format!("{sig}: {e}")))?;

            if matches!(previous.handler(), SigHandler::SigDfl) {
                installed += 1;
                tracing::debug!(signal = %sig, "Shutdown handler installed");
            } else {
                // SAFETY: restoring the disposition we just replaced.
                unsafe { signal::sigaction(sig, &previous) }
                    .map_err(|e| ProcessError::SignalInstall(format!("{sig}: {e}")))?;
                tracing::debug!(signal = %sig, "Existing handler left in place");
            }
        }
        Ok(installed)
    }
}

/// Install the shutdown handlers. Returns how many signals were taken over.
#[cfg(unix)]
pub fn install(shutdown: &Arc<Shutdown>) -> ProcessResult<usize> {
    imp::install(shutdown)
}

#[cfg(not(unix))]
pub fn install(shutdown: &Arc<Shutdown>) -> ProcessResult<usize> {
    let _ = shutdown;
    tracing::warn!("Signal-driven shutdown is not supported on this platform");
    Ok(0)
}

// src/exec/signals.rs

//! Liveness-probed signalling.
//!
//! Signals are only ever sent from the task that owns (and reaps) the
//! `Child`. That task first asks the runtime whether the child has already
//! been reaped (`try_wait`), then probes the pid with the null signal, and
//! only then delivers the real signal. A reaped pid may have been reused by
//! the OS, so it must never be signalled.

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::Child;
use tracing::{debug, warn};

use crate::types::KillSignal;

impl From<KillSignal> for Signal {
    fn from(signal: KillSignal) -> Self {
        match signal {
            KillSignal::Hup => Signal::SIGHUP,
            KillSignal::Int => Signal::SIGINT,
            KillSignal::Kill => Signal::SIGKILL,
            KillSignal::Term => Signal::SIGTERM,
        }
    }
}

/// Zero-signal probe: does `pid` still refer to a process we may signal?
pub fn is_alive(pid: u32) -> bool {
    match kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false,
        Err(Errno::EPERM) => {
            debug!(pid, "liveness probe denied; treating as gone");
            false
        }
        Err(e) => {
            warn!(pid, error = %e, "liveness probe failed");
            false
        }
    }
}

/// Send `signal` to the child if it has not exited yet.
///
/// Returns true when the signal was delivered.
pub fn signal_if_alive(child: &mut Child, pid: u32, signal: KillSignal) -> bool {
    match child.try_wait() {
        Ok(Some(status)) => {
            debug!(pid, %signal, ?status, "process already exited; not signalling");
            return false;
        }
        Ok(None) => {}
        Err(e) => {
            warn!(pid, %signal, error = %e, "could not check process status; not signalling");
            return false;
        }
    }

    if !is_alive(pid) {
        debug!(pid, %signal, "liveness probe negative; not signalling");
        return false;
    }

    match kill(Pid::from_raw(pid as i32), Signal::from(signal)) {
        Ok(()) => {
            debug!(pid, %signal, "signal sent");
            true
        }
        Err(Errno::ESRCH) => {
            debug!(pid, %signal, "process exited before signal delivery");
            false
        }
        Err(e) => {
            warn!(pid, %signal, error = %e, "failed to send signal");
            false
        }
    }
}

/// Conventional name of a raw signal number (e.g. `9` → `SIGKILL`).
pub fn signal_name(signo: i32) -> String {
    Signal::try_from(signo)
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|_| format!("SIG{signo}"))
}

// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The supervisor runtime talks to a `ProcessBackend` instead of spawning
//! directly. This makes it easy to swap in a fake backend in tests while
//! keeping the production implementation in [`super::process`].
//!
//! - `RealProcessBackend` is the default implementation used by
//!   `pipevisor`. It spawns an OS process and attaches writer, reader and
//!   watcher tasks that report back over the event channel.
//! - Tests can provide their own `ProcessBackend` that, for example, records
//!   spawn requests and hands out handles whose events the test emits by
//!   hand.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::model::DEFAULT_ESCALATION_TIMEOUT;
use crate::engine::{ProcessEvent, SpawnRequest};
use crate::errors::Result;

use super::process::{spawn_process, ProcessHandle};

/// Trait abstracting how a process is started.
pub trait ProcessBackend: Send {
    /// Spawn the requested process.
    ///
    /// The implementation must report everything that happens to the
    /// process afterwards on `events`, ending with exactly one
    /// `ProcessEvent::Exited`.
    fn spawn(
        &mut self,
        request: &SpawnRequest,
        events: mpsc::Sender<ProcessEvent>,
    ) -> Result<ProcessHandle>;
}

/// Real process backend used in production.
#[derive(Debug, Clone)]
pub struct RealProcessBackend {
    drain_timeout: Duration,
}

impl RealProcessBackend {
    /// `drain_timeout` bounds how long output channels may stay open after
    /// the process exits.
    pub fn new(drain_timeout: Duration) -> Self {
        Self { drain_timeout }
    }
}

impl Default for RealProcessBackend {
    fn default() -> Self {
        Self::new(DEFAULT_ESCALATION_TIMEOUT)
    }
}

impl ProcessBackend for RealProcessBackend {
    fn spawn(
        &mut self,
        request: &SpawnRequest,
        events: mpsc::Sender<ProcessEvent>,
    ) -> Result<ProcessHandle> {
        spawn_process(request, events, self.drain_timeout)
    }
}

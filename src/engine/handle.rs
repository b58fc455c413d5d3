// src/engine/handle.rs

//! Caller-facing handle on a running supervisor.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::command::{InboundMessage, StartArgs};
use crate::config::SupervisorSettings;
use crate::engine::core::SupervisorCore;
use crate::engine::runtime::Runtime;
use crate::engine::Emission;
use crate::errors::{PipevisorError, Result};
use crate::exec::ProcessBackend;

/// Capacity of the inbound request channel.
const REQUEST_CAPACITY: usize = 32;

/// One inbound message, optionally with a completion signal.
#[derive(Debug)]
pub struct Request {
    pub message: InboundMessage,
    /// Fired once the message is fully handled: immediately for most
    /// messages, at process close for a stop/restart of a running process.
    pub done: Option<oneshot::Sender<()>>,
}

/// Cloneable sender side of a supervisor.
///
/// Dropping every handle shuts the supervisor down: a running process is
/// stopped with the default signal and the runtime task finishes once it has
/// closed.
#[derive(Debug, Clone)]
pub struct SupervisorHandle {
    tx: mpsc::Sender<Request>,
}

impl SupervisorHandle {
    pub fn new(tx: mpsc::Sender<Request>) -> Self {
        Self { tx }
    }

    /// Deliver a message without waiting for it to be handled.
    pub async fn send(&self, message: InboundMessage) -> Result<()> {
        self.tx
            .send(Request {
                message,
                done: None,
            })
            .await
            .map_err(|_| runtime_gone())
    }

    /// Deliver a message and wait until it has been handled.
    pub async fn send_and_wait(&self, message: InboundMessage) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(Request {
                message,
                done: Some(done_tx),
            })
            .await
            .map_err(|_| runtime_gone())?;
        done_rx.await.map_err(|_| runtime_gone())
    }

    pub async fn start(&self, args: StartArgs) -> Result<()> {
        self.send_and_wait(InboundMessage::start(args)).await
    }

    /// Stop the running process; resolves once it has closed.
    pub async fn stop(&self, signal: Option<&str>) -> Result<()> {
        self.send_and_wait(InboundMessage::stop(signal)).await
    }

    /// Stop, then start again with `args`; resolves once the old process has
    /// closed and the new one has been started.
    pub async fn restart(&self, signal: Option<&str>, args: StartArgs) -> Result<()> {
        self.send_and_wait(InboundMessage::restart(signal, args)).await
    }

    /// Write raw bytes to the process input.
    pub async fn write(&self, bytes: impl Into<Vec<u8>>) -> Result<()> {
        self.send(InboundMessage::bytes(bytes)).await
    }
}

fn runtime_gone() -> PipevisorError {
    PipevisorError::Other(anyhow::anyhow!("supervisor runtime is no longer running"))
}

/// Build a supervisor for `settings` and run it on the Tokio runtime.
///
/// Emissions are delivered on `outbound`.
pub fn spawn_supervisor<B>(
    settings: SupervisorSettings,
    backend: B,
    outbound: mpsc::Sender<Emission>,
) -> (SupervisorHandle, JoinHandle<Result<()>>)
where
    B: ProcessBackend + 'static,
{
    let (tx, rx) = mpsc::channel(REQUEST_CAPACITY);
    let core = SupervisorCore::new(settings);
    let runtime = Runtime::new(core, rx, outbound, backend);
    let task = tokio::spawn(runtime.run());
    (SupervisorHandle::new(tx), task)
}

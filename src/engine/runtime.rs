// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, Sleep};
use tracing::{debug, error, info, warn};

use crate::errors::{PipevisorError, Result};
use crate::exec::{ProcessBackend, ProcessHandle};

use super::core::SupervisorCore;
use super::handle::Request;
use super::{CoreCommand, CoreStep, Emission, ProcessEvent, SupervisorEvent, SupervisorState};

/// Capacity of the internal process-event channel.
const PROCESS_EVENT_CAPACITY: usize = 64;

/// Drives the supervisor core in response to inbound requests, process
/// events and the escalation timer, and delegates spawning to a
/// `ProcessBackend`.
///
/// This is a pure IO shell around `SupervisorCore`, which contains all the
/// lifecycle semantics. It exclusively owns the live `ProcessHandle` and the
/// escalation timer, so no other task can write to the process or signal it.
pub struct Runtime<B: ProcessBackend> {
    core: SupervisorCore,
    requests: mpsc::Receiver<Request>,
    events_tx: mpsc::Sender<ProcessEvent>,
    events_rx: mpsc::Receiver<ProcessEvent>,
    outbound: mpsc::Sender<Emission>,
    backend: B,
    process: Option<ProcessHandle>,
    escalation: Option<Pin<Box<Sleep>>>,
    waiters: Vec<oneshot::Sender<()>>,
}

impl<B: ProcessBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("process", &self.process)
            .field("escalation_armed", &self.escalation.is_some())
            .finish_non_exhaustive()
    }
}

impl<B: ProcessBackend> Runtime<B> {
    pub fn new(
        core: SupervisorCore,
        requests: mpsc::Receiver<Request>,
        outbound: mpsc::Sender<Emission>,
        backend: B,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(PROCESS_EVENT_CAPACITY);
        Self {
            core,
            requests,
            events_tx,
            events_rx,
            outbound,
            backend,
            process: None,
            escalation: None,
            waiters: Vec::new(),
        }
    }

    /// Main event loop.
    ///
    /// - Consumes inbound requests, process events and timer expiry.
    /// - Feeds them into the core and executes the resulting commands.
    /// - Once the request channel closes, stops the process (if any) and
    ///   exits when the core is back to `Idle`.
    pub async fn run(mut self) -> Result<()> {
        info!("pipevisor runtime started");

        let mut host_open = true;

        loop {
            if !host_open && self.core.state() == SupervisorState::Idle {
                break;
            }

            let (event, done) = tokio::select! {
                request = self.requests.recv(), if host_open => match request {
                    Some(Request { message, done }) => (SupervisorEvent::Inbound(message), done),
                    None => {
                        info!("request channel closed; shutting down supervisor");
                        host_open = false;
                        (SupervisorEvent::HostClosed, None)
                    }
                },
                Some(event) = self.events_rx.recv() => (SupervisorEvent::Process(event), None),
                _ = escalation_elapsed(&mut self.escalation) => {
                    self.escalation = None;
                    (SupervisorEvent::EscalationElapsed, None)
                }
            };

            self.dispatch(event, done).await?;
        }

        info!("runtime exiting");
        Ok(())
    }

    /// Feed one event into the core and execute what it asks for.
    async fn dispatch(
        &mut self,
        event: SupervisorEvent,
        done: Option<oneshot::Sender<()>>,
    ) -> Result<()> {
        if !matches!(event, SupervisorEvent::Process(ProcessEvent::ChannelData { .. })) {
            debug!(?event, state = %self.core.state(), "supervisor received event");
        }

        let step = self.core.step(event);
        let settled = step.settled;
        self.execute_step(step).await?;

        if let Some(done) = done {
            if settled {
                let _ = done.send(());
            } else {
                self.waiters.push(done);
            }
        }

        Ok(())
    }

    async fn execute_step(&mut self, step: CoreStep) -> Result<()> {
        let mut queue: VecDeque<CoreCommand> = step.commands.into();

        while let Some(command) = queue.pop_front() {
            if let Some(follow_up) = self.execute_command(command).await? {
                // Follow-ups run before the rest of the original step.
                for command in follow_up.commands.into_iter().rev() {
                    queue.push_front(command);
                }
            }
        }

        Ok(())
    }

    /// Execute a single command from the core.
    ///
    /// Spawning feeds its outcome straight back into the core, so the
    /// resulting step is returned for the caller to execute.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<Option<CoreStep>> {
        match command {
            CoreCommand::Spawn(request) => {
                let event = match self.backend.spawn(&request, self.events_tx.clone()) {
                    Ok(handle) => {
                        let pid = handle.pid();
                        self.process = Some(handle);
                        SupervisorEvent::Spawned { pid }
                    }
                    Err(PipevisorError::SpawnFailure(error)) => {
                        SupervisorEvent::SpawnFailed { error }
                    }
                    Err(err) => SupervisorEvent::SpawnFailed {
                        error: err.to_string(),
                    },
                };
                return Ok(Some(self.core.step(event)));
            }
            CoreCommand::WriteInput(bytes) => match self.process.as_ref() {
                Some(process) => {
                    if let Err(err) = process.write(bytes) {
                        debug!(error = %err, "input write failed");
                    }
                }
                None => debug!("no process to write input to"),
            },
            CoreCommand::CloseInput => {
                if let Some(process) = self.process.as_mut() {
                    process.close_input();
                }
            }
            CoreCommand::Signal(signal) => match self.process.as_ref() {
                Some(process) => {
                    if let Err(err) = process.signal(signal) {
                        warn!(error = %err, "could not request signal");
                    }
                }
                None => debug!(%signal, "no process to signal"),
            },
            CoreCommand::ArmEscalation(after) => {
                debug!(?after, "arming escalation timer");
                self.escalation = Some(Box::pin(sleep(after)));
            }
            CoreCommand::CancelEscalation => {
                if self.escalation.take().is_some() {
                    debug!("escalation timer cancelled");
                }
            }
            CoreCommand::Emit(emission) => {
                if self.outbound.send(emission).await.is_err() {
                    debug!("outbound channel closed; dropping emission");
                }
            }
            CoreCommand::ReleaseProcess => {
                self.process = None;
            }
            CoreCommand::SettleWaiters => {
                for waiter in self.waiters.drain(..) {
                    let _ = waiter.send(());
                }
            }
            CoreCommand::Report(err) => {
                if err.is_validation() {
                    error!(error = %err, "invalid command");
                } else {
                    error!(error = %err, "supervisor error");
                }
            }
        }

        Ok(None)
    }
}

/// Resolves when the armed timer fires; never resolves when unarmed.
async fn escalation_elapsed(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

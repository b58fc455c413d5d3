// src/exec/process.rs

//! Spawning and owning one supervised OS process.
//!
//! A spawned process is split across three kinds of Tokio tasks, each of
//! which only reports back through `ProcessEvent`s:
//!
//! - the **writer** owns `ChildStdin` and drains input chunks in order;
//! - one **reader** per piped output channel (see [`super::router`]);
//! - the **watcher** owns the `Child`, serves signal requests (so signalling
//!   and reaping never race) and reports `Exited` once the process is gone
//!   and its readers are drained.
//!
//! The supervisor keeps a [`ProcessHandle`] with the senders feeding the
//! writer and the watcher.

use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::unix::pipe;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::engine::{ProcessEvent, SpawnRequest};
use crate::errors::{PipevisorError, Result};
use crate::exec::pipes::ExtraPipes;
use crate::exec::router::spawn_reader;
use crate::exec::signals::{signal_if_alive, signal_name};
use crate::stdio::ChannelRole;
use crate::types::KillSignal;

/// Supervisor-side handle on one live process.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: u32,
    input: Option<mpsc::UnboundedSender<Vec<u8>>>,
    signals: mpsc::UnboundedSender<KillSignal>,
}

impl ProcessHandle {
    pub fn new(
        pid: u32,
        input: mpsc::UnboundedSender<Vec<u8>>,
        signals: mpsc::UnboundedSender<KillSignal>,
    ) -> Self {
        Self {
            pid,
            input: Some(input),
            signals,
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Queue bytes for the process input.
    ///
    /// Best effort: fails with `ChannelWriteFailure` once input is closed or
    /// the writer has given up (e.g. broken pipe).
    pub fn write(&self, bytes: Vec<u8>) -> Result<()> {
        let input = self.input.as_ref().ok_or_else(|| {
            PipevisorError::ChannelWriteFailure(format!("input of pid {} is closed", self.pid))
        })?;

        input.send(bytes).map_err(|_| {
            PipevisorError::ChannelWriteFailure(format!("input of pid {} is gone", self.pid))
        })
    }

    /// End the input stream. Pending writes are flushed first.
    pub fn close_input(&mut self) {
        if self.input.take().is_some() {
            debug!(pid = self.pid, "closing process input");
        }
    }

    /// Ask the watcher to send `signal` (behind a liveness probe).
    pub fn signal(&self, signal: KillSignal) -> Result<()> {
        self.signals.send(signal).map_err(|_| {
            PipevisorError::Other(anyhow::anyhow!(
                "process {} is no longer watched; cannot send {signal}",
                self.pid
            ))
        })
    }
}

fn stdio_for(role: Option<ChannelRole>) -> Stdio {
    match role {
        Some(ChannelRole::Pipe) => Stdio::piped(),
        _ => Stdio::null(),
    }
}

/// Spawn the process described by `request` and attach its tasks.
///
/// `drain_timeout` bounds how long the watcher waits for output channels to
/// close after the process itself has exited.
pub fn spawn_process(
    request: &SpawnRequest,
    events: mpsc::Sender<ProcessEvent>,
    drain_timeout: Duration,
) -> Result<ProcessHandle> {
    let plan = &request.plan;

    let mut cmd = Command::new(&request.path);
    cmd.args(&request.args)
        .envs(&request.env)
        .stdin(Stdio::piped())
        .stdout(stdio_for(plan.role(1)))
        .stderr(stdio_for(plan.role(2)))
        .kill_on_drop(true);

    let extra = ExtraPipes::create(plan.extra_fds()).map_err(|e| {
        PipevisorError::SpawnFailure(format!("creating output pipes for '{}': {e}", request.path))
    })?;
    extra.install(&mut cmd);

    let mut child = cmd
        .spawn()
        .map_err(|e| PipevisorError::SpawnFailure(format!("'{}': {e}", request.path)))?;

    let extra_readers = extra.into_readers();

    let Some(pid) = child.id() else {
        return Err(PipevisorError::SpawnFailure(format!(
            "'{}' did not yield a process id",
            request.path
        )));
    };

    info!(pid, path = %request.path, "spawned process");

    let mut readers = JoinSet::new();
    if let Some(stdout) = child.stdout.take() {
        spawn_reader(&mut readers, pid, 1, stdout, events.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_reader(&mut readers, pid, 2, stderr, events.clone());
    }
    for (index, fd) in extra_readers {
        // Reactor-driven pipe: aborting the reader really closes the fd.
        match pipe::Receiver::from_owned_fd(fd) {
            Ok(receiver) => spawn_reader(&mut readers, pid, index, receiver, events.clone()),
            Err(e) => warn!(pid, index, error = %e, "cannot read output channel; dropping it"),
        }
    }

    let (input_tx, input_rx) = mpsc::unbounded_channel();
    match child.stdin.take() {
        Some(stdin) => {
            tokio::spawn(write_input(pid, stdin, input_rx, events.clone()));
        }
        None => warn!(pid, "process input is not piped"),
    }

    let (signal_tx, signal_rx) = mpsc::unbounded_channel();
    tokio::spawn(watch_process(
        pid,
        child,
        signal_rx,
        readers,
        events,
        drain_timeout,
    ));

    Ok(ProcessHandle::new(pid, input_tx, signal_tx))
}

/// Writer task: owns stdin until the handle closes it or a write fails.
async fn write_input(
    pid: u32,
    mut stdin: ChildStdin,
    mut input: mpsc::UnboundedReceiver<Vec<u8>>,
    events: mpsc::Sender<ProcessEvent>,
) {
    while let Some(chunk) = input.recv().await {
        if let Err(e) = stdin.write_all(&chunk).await {
            let err = PipevisorError::ChannelWriteFailure(e.to_string());
            debug!(pid, error = %err, "dropping process input");
            break;
        }
    }

    if let Err(e) = stdin.shutdown().await {
        debug!(pid, error = %e, "error while closing process input");
    }
    drop(stdin);

    let _ = events.send(ProcessEvent::InputClosed { pid }).await;
}

/// Watcher task: reap the child, serve signal requests, then report close.
async fn watch_process(
    pid: u32,
    mut child: Child,
    mut signals: mpsc::UnboundedReceiver<KillSignal>,
    mut readers: JoinSet<()>,
    events: mpsc::Sender<ProcessEvent>,
    drain_timeout: Duration,
) {
    let mut killed = false;

    let status = loop {
        tokio::select! {
            status = child.wait() => break status,
            Some(signal) = signals.recv() => {
                if signal_if_alive(&mut child, pid, signal) {
                    killed = true;
                }
            }
        }
    };

    let (code, signal) = match status {
        Ok(status) => exit_parts(status),
        Err(e) => {
            warn!(pid, error = %e, "failed to wait for process");
            (None, None)
        }
    };

    let drained = timeout(drain_timeout, async {
        while readers.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        warn!(pid, "output channels still open after exit; detaching them");
        readers.abort_all();
        while readers.join_next().await.is_some() {}
    }

    let _ = events
        .send(ProcessEvent::Exited {
            pid,
            code,
            signal,
            killed,
        })
        .await;
}

fn exit_parts(status: ExitStatus) -> (Option<i32>, Option<String>) {
    (status.code(), status.signal().map(signal_name))
}

use std::sync::{Arc, Mutex};

use pipevisor::engine::{ProcessEvent, SpawnRequest};
use pipevisor::errors::{PipevisorError, Result};
use pipevisor::exec::{ProcessBackend, ProcessHandle};
use pipevisor::types::KillSignal;
use tokio::sync::mpsc;

/// First pid handed out by `FakeBackend`.
pub const FIRST_FAKE_PID: u32 = 4000;

/// One "process" handed out by `FakeBackend`.
///
/// The test plays the part of the process: it reads what the supervisor
/// writes and signals, and emits the events a real process would cause.
pub struct FakeProcess {
    pub pid: u32,
    pub request: SpawnRequest,
    pub input: mpsc::UnboundedReceiver<Vec<u8>>,
    pub signals: mpsc::UnboundedReceiver<KillSignal>,
    events: mpsc::Sender<ProcessEvent>,
}

impl FakeProcess {
    pub async fn emit(&self, event: ProcessEvent) {
        self.events
            .send(event)
            .await
            .expect("supervisor runtime dropped its event channel");
    }

    /// Produce `data` on output channel `index`.
    pub async fn output(&self, index: usize, data: &[u8]) {
        self.emit(ProcessEvent::ChannelData {
            pid: self.pid,
            index,
            data: data.to_vec(),
        })
        .await;
    }

    pub async fn input_closed(&self) {
        self.emit(ProcessEvent::InputClosed { pid: self.pid }).await;
    }

    pub async fn exit(&self, code: Option<i32>, signal: Option<&str>, killed: bool) {
        self.emit(ProcessEvent::Exited {
            pid: self.pid,
            code,
            signal: signal.map(str::to_string),
            killed,
        })
        .await;
    }

    /// Wait for the supervisor to close input; returns everything written.
    pub async fn drain_input(&mut self) -> Vec<u8> {
        let mut written = Vec::new();
        while let Some(chunk) = self.input.recv().await {
            written.extend(chunk);
        }
        written
    }

    pub async fn next_signal(&mut self) -> Option<KillSignal> {
        self.signals.recv().await
    }
}

/// A fake backend that:
/// - records every spawn request
/// - hands each spawned `FakeProcess` to the test over a channel
/// - optionally fails every spawn with a fixed error.
#[derive(Clone)]
pub struct FakeBackend {
    spawned: mpsc::UnboundedSender<FakeProcess>,
    requests: Arc<Mutex<Vec<SpawnRequest>>>,
    fail_with: Option<String>,
    next_pid: Arc<Mutex<u32>>,
}

impl FakeBackend {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FakeProcess>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = Self {
            spawned: tx,
            requests: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
            next_pid: Arc::new(Mutex::new(FIRST_FAKE_PID)),
        };
        (backend, rx)
    }

    /// A backend whose spawns always fail with `error`.
    pub fn failing(error: &str) -> (Self, mpsc::UnboundedReceiver<FakeProcess>) {
        let (mut backend, rx) = Self::new();
        backend.fail_with = Some(error.to_string());
        (backend, rx)
    }

    /// Shared log of spawn requests, in order.
    pub fn requests(&self) -> Arc<Mutex<Vec<SpawnRequest>>> {
        Arc::clone(&self.requests)
    }
}

impl ProcessBackend for FakeBackend {
    fn spawn(
        &mut self,
        request: &SpawnRequest,
        events: mpsc::Sender<ProcessEvent>,
    ) -> Result<ProcessHandle> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(error) = &self.fail_with {
            return Err(PipevisorError::SpawnFailure(error.clone()));
        }

        let pid = {
            let mut next = self.next_pid.lock().unwrap();
            let pid = *next;
            *next += 1;
            pid
        };

        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        let _ = self.spawned.send(FakeProcess {
            pid,
            request: request.clone(),
            input: input_rx,
            signals: signal_rx,
            events,
        });

        Ok(ProcessHandle::new(pid, input_tx, signal_tx))
    }
}

// src/engine/mod.rs

//! Process supervisor engine.
//!
//! This module ties together:
//! - the lifecycle state machine for one external process
//!   (`Idle → Starting → Running → Stopping → Idle`)
//! - the routing of channel output into tagged outbound emissions
//! - the termination protocol (close input, graceful signal, forced kill on
//!   escalation timeout)
//!
//! The pure core state machine lives in [`core`] (with its handlers in
//! [`event_handlers`]); the async/IO shell that owns the live process and
//! the escalation timer is implemented in [`runtime`]. Callers talk to the
//! shell through a [`SupervisorHandle`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::command::InboundMessage;
use crate::stdio::StdioPlan;

/// Lifecycle state of the supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SupervisorState::Idle => "idle",
            SupervisorState::Starting => "starting",
            SupervisorState::Running => "running",
            SupervisorState::Stopping => "stopping",
        };
        f.write_str(s)
    }
}

/// Events produced by the tasks attached to one live process.
///
/// Every event carries the pid it belongs to so that late events from a
/// previous process (e.g. across a restart) can be told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// A chunk read from output channel `index`.
    ChannelData { pid: u32, index: usize, data: Vec<u8> },
    /// Output channel `index` reached EOF or failed.
    ChannelClosed { pid: u32, index: usize },
    /// The input channel was closed (requested, or the process went away).
    InputClosed { pid: u32 },
    /// The process exited and all of its output channels were drained.
    Exited {
        pid: u32,
        code: Option<i32>,
        signal: Option<String>,
        killed: bool,
    },
}

impl ProcessEvent {
    pub fn pid(&self) -> u32 {
        match self {
            ProcessEvent::ChannelData { pid, .. }
            | ProcessEvent::ChannelClosed { pid, .. }
            | ProcessEvent::InputClosed { pid }
            | ProcessEvent::Exited { pid, .. } => *pid,
        }
    }
}

/// Everything the core state machine reacts to.
#[derive(Debug, Clone)]
pub enum SupervisorEvent {
    /// A message from the surrounding dataflow.
    Inbound(InboundMessage),
    /// The shell spawned the requested process.
    Spawned { pid: u32 },
    /// The shell could not spawn the requested process.
    SpawnFailed { error: String },
    /// Something happened on the live process.
    Process(ProcessEvent),
    /// The escalation timer armed by a stop fired.
    EscalationElapsed,
    /// The host is going away; stop whatever is running.
    HostClosed,
}

/// What the shell should spawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub path: String,
    pub args: Vec<String>,
    /// Overrides merged onto the inherited environment.
    pub env: BTreeMap<String, String>,
    pub plan: StdioPlan,
}

/// Lifecycle payloads sent on the status topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StatusPayload {
    Spawn {
        pid: u32,
    },
    Error {
        error: String,
    },
    Close {
        pid: u32,
        code: Option<i32>,
        signal: Option<String>,
        killed: bool,
    },
}

/// Payload of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Status(StatusPayload),
    Data(Vec<u8>),
}

/// One message emitted towards the dataflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub topic: String,
    pub payload: Payload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// An outbound message and the output port it is delivered on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Emission {
    pub port: usize,
    #[serde(flatten)]
    pub message: OutboundMessage,
}

impl Emission {
    pub fn status(&self) -> Option<&StatusPayload> {
        match &self.message.payload {
            Payload::Status(status) => Some(status),
            Payload::Data(_) => None,
        }
    }

    pub fn data(&self) -> Option<&[u8]> {
        match &self.message.payload {
            Payload::Data(data) => Some(data),
            Payload::Status(_) => None,
        }
    }
}

pub mod core;
pub mod event_handlers;
pub mod handle;
pub mod router;
pub mod runtime;

pub use core::SupervisorCore;
pub use event_handlers::{CoreCommand, CoreStep};
pub use handle::{spawn_supervisor, Request, SupervisorHandle};
pub use router::Router;
pub use runtime::Runtime;

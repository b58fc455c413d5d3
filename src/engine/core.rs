// src/engine/core.rs

//! Pure core supervisor state machine.
//!
//! This module contains a synchronous, deterministic "core supervisor" that
//! consumes [`SupervisorEvent`]s and produces:
//! - an updated lifecycle state
//! - a list of [`CoreCommand`]s describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for:
//! - owning the live process handle and the escalation timer
//! - reading inbound messages and process events from channels
//! - delivering emissions and settling callers
//!
//! The core has no channels, no Tokio types, and performs no IO, so the
//! whole lifecycle can be unit tested without spawning anything.
//!
//! [`CoreCommand`]: crate::engine::CoreCommand

use crate::config::SupervisorSettings;
use crate::engine::event_handlers::{
    handle_escalation, handle_host_closed, handle_inbound, handle_process_event,
    handle_spawn_failed, handle_spawned, CoreStep, PendingStart, RunContext, StartCall,
};
use crate::engine::{SupervisorEvent, SupervisorState};

/// Pure core supervisor state.
#[derive(Debug)]
pub struct SupervisorCore {
    pub(crate) settings: SupervisorSettings,
    pub(crate) state: SupervisorState,
    pub(crate) starting: Option<PendingStart>,
    pub(crate) run: Option<RunContext>,
    pub(crate) restart_after_close: Option<StartCall>,
}

impl SupervisorCore {
    pub fn new(settings: SupervisorSettings) -> Self {
        Self {
            settings,
            state: SupervisorState::Idle,
            starting: None,
            run: None,
            restart_after_close: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn settings(&self) -> &SupervisorSettings {
        &self.settings
    }

    /// Pid of the live process, if any.
    pub fn pid(&self) -> Option<u32> {
        self.run.as_ref().map(|run| run.pid)
    }

    /// Handle a single event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: SupervisorEvent) -> CoreStep {
        match event {
            SupervisorEvent::Inbound(msg) => handle_inbound(self, msg),
            SupervisorEvent::Spawned { pid } => handle_spawned(self, pid),
            SupervisorEvent::SpawnFailed { error } => handle_spawn_failed(self, error),
            SupervisorEvent::Process(event) => handle_process_event(self, event),
            SupervisorEvent::EscalationElapsed => handle_escalation(self),
            SupervisorEvent::HostClosed => handle_host_closed(self),
        }
    }
}

// src/engine/event_handlers.rs

//! Event handling logic for the core supervisor.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::command::validate::{validate_args, validate_outputs, validate_path};
use crate::command::{Command, Filenames, InboundMessage, StartArgs};
use crate::engine::core::SupervisorCore;
use crate::engine::router::{status_emission, Router};
use crate::engine::{Emission, ProcessEvent, SpawnRequest, StatusPayload, SupervisorState};
use crate::errors::{PipevisorError, Result};
use crate::stdio::{StdioPlan, TopicSet, STATUS_TOPIC};
use crate::types::KillSignal;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug)]
pub enum CoreCommand {
    /// Spawn a process; the shell answers with `Spawned` or `SpawnFailed`.
    Spawn(SpawnRequest),
    /// Write bytes to the live process's input.
    WriteInput(Vec<u8>),
    /// End the input stream (pending writes are flushed first).
    CloseInput,
    /// Send a signal to the live process, behind a liveness probe.
    Signal(KillSignal),
    /// Arm the escalation timer.
    ArmEscalation(Duration),
    /// Cancel the escalation timer, if armed.
    CancelEscalation,
    /// Deliver a message to the dataflow.
    Emit(Emission),
    /// Drop the process handle; the process has closed.
    ReleaseProcess,
    /// Settle every caller waiting for the in-flight termination.
    SettleWaiters,
    /// Surface an error on the host's error-reporting path.
    Report(PipevisorError),
}

/// Decision returned by the core after handling a single event.
#[derive(Debug)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the triggering message is fully handled now. When false, the
    /// caller is settled by a later `SettleWaiters` (i.e. at process close).
    pub settled: bool,
}

impl CoreStep {
    pub fn done(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            settled: true,
        }
    }

    pub fn pending(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            settled: false,
        }
    }

    fn idle() -> Self {
        Self::done(Vec::new())
    }
}

/// A deferred `start` call (from `restart`).
#[derive(Debug, Clone)]
pub(crate) struct StartCall {
    pub args: StartArgs,
    pub payload: Option<Vec<u8>>,
    pub filename: Option<Filenames>,
}

/// Run data prepared while `Starting`.
#[derive(Debug)]
pub(crate) struct PendingStart {
    pub router: Router,
    pub initial_payload: Option<Vec<u8>>,
}

/// Run data for the live process.
#[derive(Debug)]
pub(crate) struct RunContext {
    pub pid: u32,
    pub router: Router,
    pub input_open: bool,
    /// Signal still to be sent once input has closed during a stop.
    pub pending_signal: Option<KillSignal>,
}

/// Handle a message from the dataflow.
///
/// - While stopping, everything is dropped (stop/restart callers are settled
///   when the in-flight termination completes).
/// - Raw bytes while running go straight to the process input; an empty
///   payload is a graceful stop.
/// - Otherwise the `action` command is dispatched.
pub fn handle_inbound(core: &mut SupervisorCore, msg: InboundMessage) -> CoreStep {
    let InboundMessage {
        payload,
        action,
        filename,
    } = msg;

    if core.state == SupervisorState::Stopping {
        debug!("process is stopping; dropping inbound message");
        return match action {
            Some(Command::Stop { .. }) | Some(Command::Restart { .. }) => {
                CoreStep::pending(Vec::new())
            }
            _ => CoreStep::idle(),
        };
    }

    if core.state == SupervisorState::Running {
        if let Some(bytes) = payload.as_ref() {
            if bytes.is_empty() {
                debug!("empty payload; treating as graceful stop request");
                return handle_stop(core, None);
            }
            return CoreStep::done(vec![CoreCommand::WriteInput(payload.unwrap_or_default())]);
        }
    }

    match action {
        Some(Command::Start(args)) => handle_start(core, args, payload, filename),
        Some(Command::Stop { signal }) => handle_stop(core, signal.as_deref()),
        Some(Command::Restart { signal, start }) => handle_restart(
            core,
            signal.as_deref(),
            StartCall {
                args: start,
                payload,
                filename,
            },
        ),
        None => {
            if payload.is_some() {
                debug!(state = %core.state, "no running process; dropping payload");
            }
            CoreStep::idle()
        }
    }
}

/// Handle `start`: only permitted from `Idle`.
pub fn handle_start(
    core: &mut SupervisorCore,
    args: StartArgs,
    payload: Option<Vec<u8>>,
    filename: Option<Filenames>,
) -> CoreStep {
    if core.state != SupervisorState::Idle {
        debug!(state = %core.state, "start ignored; a process is already active");
        return CoreStep::idle();
    }

    let (request, router) = match prepare_start(core, &args, filename) {
        Ok(prepared) => prepared,
        Err(err) => {
            warn!(error = %err, "start rejected");
            return CoreStep::done(vec![CoreCommand::Report(err)]);
        }
    };

    info!(
        path = %request.path,
        args = ?request.args,
        outputs = router.topics().len() - 1,
        "starting process"
    );

    core.state = SupervisorState::Starting;
    core.starting = Some(PendingStart {
        router,
        initial_payload: payload,
    });

    CoreStep::done(vec![CoreCommand::Spawn(request)])
}

/// Resolve overrides against instance defaults and build the run plan.
fn prepare_start(
    core: &SupervisorCore,
    args: &StartArgs,
    filename: Option<Filenames>,
) -> Result<(SpawnRequest, Router)> {
    let settings = &core.settings;

    let path = match args.path.as_deref() {
        Some(p) => validate_path(p, &settings.tool)?,
        None => settings.cmd_path.clone(),
    };

    let cmd_args = match args.args.as_ref() {
        Some(value) => validate_args(value)?,
        None => settings.cmd_args.clone(),
    };

    let (outputs, default_topics) = match args.outputs.as_ref() {
        Some(value) => (validate_outputs(value, settings.outputs_max)?, None),
        None => (
            settings.cmd_outputs,
            settings.topics.clone().map(Value::from),
        ),
    };

    let overrides = args.topics.clone().or(default_topics);
    let topics = TopicSet::resolve(
        outputs,
        overrides.as_ref(),
        settings.delivery,
        &settings.topic_prefix,
    )?;

    let plan = StdioPlan::for_outputs(outputs);
    let filenames = filename.map(Filenames::into_vec).unwrap_or_default();
    let router = Router::new(plan.clone(), topics, filenames, settings.delivery);

    let request = SpawnRequest {
        path,
        args: cmd_args,
        env: args.env.clone().unwrap_or_default(),
        plan,
    };

    Ok((request, router))
}

/// Handle the shell's report that the process was spawned.
pub fn handle_spawned(core: &mut SupervisorCore, pid: u32) -> CoreStep {
    let Some(pending) = core.starting.take() else {
        warn!(pid, state = %core.state, "spawn reported without a pending start");
        return CoreStep::idle();
    };

    info!(pid, "process spawned");

    let mut commands = vec![CoreCommand::Emit(
        pending.router.status(StatusPayload::Spawn { pid }),
    )];

    if let Some(payload) = pending.initial_payload.filter(|p| !p.is_empty()) {
        commands.push(CoreCommand::WriteInput(payload));
    }

    core.state = SupervisorState::Running;
    core.run = Some(RunContext {
        pid,
        router: pending.router,
        input_open: true,
        pending_signal: None,
    });

    CoreStep::done(commands)
}

/// Handle a spawn failure: report it and return to `Idle`.
pub fn handle_spawn_failed(core: &mut SupervisorCore, error: String) -> CoreStep {
    let emission = match core.starting.take() {
        Some(pending) => pending.router.status(StatusPayload::Error {
            error: error.clone(),
        }),
        None => status_emission(
            STATUS_TOPIC,
            StatusPayload::Error {
                error: error.clone(),
            },
        ),
    };

    core.state = SupervisorState::Idle;
    core.restart_after_close = None;

    CoreStep::done(vec![
        CoreCommand::Emit(emission),
        CoreCommand::Report(PipevisorError::SpawnFailure(error)),
    ])
}

/// Handle `stop`: only meaningful from `Running`.
///
/// Closes input, arms the escalation timer and, once input has closed,
/// sends the resolved signal. The caller is settled at process close.
pub fn handle_stop(core: &mut SupervisorCore, requested: Option<&str>) -> CoreStep {
    match core.state {
        SupervisorState::Idle | SupervisorState::Starting => {
            debug!(state = %core.state, "stop ignored; no running process");
            return CoreStep::idle();
        }
        SupervisorState::Stopping => {
            debug!("stop ignored; termination already in flight");
            return CoreStep::pending(Vec::new());
        }
        SupervisorState::Running => {}
    }

    let signal = KillSignal::resolve(requested, core.settings.kill_signal);
    if let Some(name) = requested {
        if name != signal.name() {
            debug!(requested = %name, fallback = %signal, "unsupported signal; using default");
        }
    }

    let Some(run) = core.run.as_mut() else {
        warn!("running state without a run context; resetting to idle");
        core.state = SupervisorState::Idle;
        return CoreStep::idle();
    };

    info!(pid = run.pid, %signal, "stopping process");
    core.state = SupervisorState::Stopping;

    let mut commands = vec![
        CoreCommand::CloseInput,
        CoreCommand::ArmEscalation(core.settings.escalation_timeout),
    ];

    if run.input_open {
        run.pending_signal = Some(signal);
    } else {
        commands.push(CoreCommand::Signal(signal));
    }

    CoreStep::pending(commands)
}

/// Handle `restart`: stop (if running), then start with the given args once
/// the process has closed.
pub fn handle_restart(
    core: &mut SupervisorCore,
    requested: Option<&str>,
    call: StartCall,
) -> CoreStep {
    match core.state {
        SupervisorState::Idle => handle_start(core, call.args, call.payload, call.filename),
        SupervisorState::Running => {
            let step = handle_stop(core, requested);
            if core.state == SupervisorState::Stopping {
                core.restart_after_close = Some(call);
            }
            step
        }
        SupervisorState::Starting | SupervisorState::Stopping => {
            debug!(state = %core.state, "restart ignored");
            CoreStep::idle()
        }
    }
}

/// Handle an event from the live process.
pub fn handle_process_event(core: &mut SupervisorCore, event: ProcessEvent) -> CoreStep {
    let current = core.run.as_ref().map(|run| run.pid);
    if current != Some(event.pid()) {
        debug!(pid = event.pid(), ?current, "ignoring event from a previous process");
        return CoreStep::idle();
    }

    match event {
        ProcessEvent::ChannelData { index, data, .. } => {
            let routed = core.run.as_ref().and_then(|run| run.router.route(index, data));
            match routed {
                Some(emission) => CoreStep::done(vec![CoreCommand::Emit(emission)]),
                None => {
                    debug!(index, "data on an unrouted channel; dropping");
                    CoreStep::idle()
                }
            }
        }
        ProcessEvent::ChannelClosed { pid, index } => {
            debug!(pid, index, "output channel closed");
            CoreStep::idle()
        }
        ProcessEvent::InputClosed { pid } => {
            debug!(pid, "input channel closed");
            let mut commands = Vec::new();
            if let Some(run) = core.run.as_mut() {
                run.input_open = false;
                if core.state == SupervisorState::Stopping {
                    if let Some(signal) = run.pending_signal.take() {
                        commands.push(CoreCommand::Signal(signal));
                    }
                }
            }
            CoreStep::done(commands)
        }
        ProcessEvent::Exited {
            pid,
            code,
            signal,
            killed,
        } => handle_exited(core, pid, code, signal, killed),
    }
}

fn handle_exited(
    core: &mut SupervisorCore,
    pid: u32,
    code: Option<i32>,
    signal: Option<String>,
    killed: bool,
) -> CoreStep {
    info!(pid, ?code, ?signal, killed, "process closed");

    let Some(run) = core.run.take() else {
        return CoreStep::idle();
    };

    core.state = SupervisorState::Idle;

    let mut commands = vec![
        CoreCommand::CancelEscalation,
        CoreCommand::Emit(run.router.status(StatusPayload::Close {
            pid,
            code,
            signal,
            killed,
        })),
        CoreCommand::ReleaseProcess,
    ];

    if let Some(call) = core.restart_after_close.take() {
        debug!("restarting after close");
        let step = handle_start(core, call.args, call.payload, call.filename);
        commands.extend(step.commands);
    }

    // Waiters (stop/restart callers) are settled after any restart spawn.
    commands.push(CoreCommand::SettleWaiters);

    CoreStep::done(commands)
}

/// Handle the escalation timer: force-kill and keep waiting for close.
pub fn handle_escalation(core: &mut SupervisorCore) -> CoreStep {
    if core.state != SupervisorState::Stopping {
        debug!(state = %core.state, "escalation timer fired outside of a stop; ignoring");
        return CoreStep::idle();
    }

    if let Some(run) = core.run.as_mut() {
        warn!(pid = run.pid, "process did not close in time; sending SIGKILL");
        run.pending_signal = None;
    }

    CoreStep::done(vec![CoreCommand::Signal(KillSignal::Kill)])
}

/// Handle host shutdown: a stop with the default signal; no restart.
pub fn handle_host_closed(core: &mut SupervisorCore) -> CoreStep {
    core.restart_after_close = None;
    match core.state {
        SupervisorState::Running => handle_stop(core, None),
        SupervisorState::Stopping => CoreStep::pending(Vec::new()),
        SupervisorState::Idle | SupervisorState::Starting => CoreStep::idle(),
    }
}

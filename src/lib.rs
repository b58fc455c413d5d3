// src/lib.rs

pub mod bridge;
pub mod cli;
pub mod command;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod stdio;
pub mod types;

use std::io::BufReader;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::command::{InboundMessage, StartArgs};
use crate::config::{load_or_default, ConfigFile};
use crate::engine::{spawn_supervisor, Emission};
use crate::exec::RealProcessBackend;

/// Capacity of the outbound emission channel.
const OUTBOUND_CAPACITY: usize = 256;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - supervisor runtime + real process backend
/// - the JSON-lines bridge on stdin/stdout
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let settings = cfg.supervisor;
    let (out_tx, out_rx) = mpsc::channel::<Emission>(OUTBOUND_CAPACITY);

    let backend = RealProcessBackend::new(settings.escalation_timeout);
    let (handle, supervisor) = spawn_supervisor(settings, backend, out_tx);

    let printer = tokio::spawn(bridge::pump_outbound(out_rx, tokio::io::stdout()));

    if args.autostart {
        info!("autostart requested; starting configured command");
        handle
            .send(InboundMessage::start(StartArgs::default()))
            .await?;
    }

    let lines = bridge::spawn_line_reader(BufReader::new(std::io::stdin()));
    let inbound = bridge::pump_inbound(lines, handle.clone());

    tokio::select! {
        res = inbound => res?,
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("Ctrl-C received; stopping supervisor");
        }
    }

    // Last handle gone: the runtime stops the process and winds down.
    drop(handle);
    supervisor.await??;
    printer.await??;

    Ok(())
}

/// Simple dry-run output: print the resolved settings.
fn print_dry_run(cfg: &ConfigFile) {
    let s = &cfg.supervisor;

    println!("pipevisor dry-run");
    println!("  tool = {}", s.tool);
    println!("  cmd_path = {}", s.cmd_path);
    println!("  cmd_args = {:?}", s.cmd_args);
    println!("  cmd_outputs = {}", s.cmd_outputs);
    println!("  outputs_max = {}", s.outputs_max);
    println!("  kill_signal = {}", s.kill_signal);
    println!("  delivery = {:?}", s.delivery);
    if let Some(ref topics) = s.topics {
        println!("  topics = {topics:?}");
    }
    if !s.topic_prefix.is_empty() {
        println!("  topic_prefix = {}", s.topic_prefix);
    }
    println!("  escalation_timeout = {:?}", s.escalation_timeout);

    debug!("dry-run complete (no process spawned)");
}

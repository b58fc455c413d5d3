// src/command/mod.rs

//! Inbound command model.
//!
//! - [`Command`] is the discriminated union of lifecycle commands
//!   (`start` / `stop` / `restart`), decoded from the `action` object of an
//!   inbound message.
//! - [`InboundMessage`] is the full message as handed to the supervisor.
//! - [`validate`] holds the pure validation checks applied to command
//!   overrides and configuration.
//! - [`args`] holds the JSON-or-passthrough argument parsing used for
//!   free-form argument strings.

pub mod args;
pub mod validate;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Overrides carried by `start` and `restart`.
///
/// Fields are left loosely typed where the validator owns the decision
/// (`args`, `outputs`, `topics`), so that e.g. a bare argument string reaches
/// the validator and is rejected with `InvalidArgs` rather than failing
/// decoding.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StartArgs {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub args: Option<Value>,
    #[serde(default)]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub outputs: Option<Value>,
    #[serde(default)]
    pub topics: Option<Value>,
}

/// A lifecycle command, tagged by `command`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Command {
    Start(StartArgs),
    Stop {
        #[serde(default)]
        signal: Option<String>,
    },
    Restart {
        #[serde(default)]
        signal: Option<String>,
        #[serde(flatten)]
        start: StartArgs,
    },
}

/// Output filenames attached to data emissions.
///
/// Accepts either a single name or a list; a single name applies to the
/// first output channel only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Filenames {
    One(String),
    Many(Vec<String>),
}

impl Filenames {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Filenames::One(name) => vec![name],
            Filenames::Many(names) => names,
        }
    }
}

/// One message from the surrounding dataflow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundMessage {
    /// Raw bytes for the process input (or the initial payload on `start`).
    pub payload: Option<Vec<u8>>,
    pub action: Option<Command>,
    pub filename: Option<Filenames>,
}

impl InboundMessage {
    /// Message carrying only raw input bytes.
    pub fn bytes(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: Some(payload.into()),
            ..Self::default()
        }
    }

    /// Message carrying only a command.
    pub fn command(command: Command) -> Self {
        Self {
            action: Some(command),
            ..Self::default()
        }
    }

    pub fn start(start: StartArgs) -> Self {
        Self::command(Command::Start(start))
    }

    pub fn stop(signal: Option<&str>) -> Self {
        Self::command(Command::Stop {
            signal: signal.map(str::to_string),
        })
    }

    pub fn restart(signal: Option<&str>, start: StartArgs) -> Self {
        Self::command(Command::Restart {
            signal: signal.map(str::to_string),
            start,
        })
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_filename(mut self, filename: Filenames) -> Self {
        self.filename = Some(filename);
        self
    }
}

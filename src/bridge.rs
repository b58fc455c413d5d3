// src/bridge.rs

//! JSON-lines bridge between a host process and the supervisor.
//!
//! Each inbound line is one message:
//!
//! ```json
//! {"action": {"command": "start", "args": ["-i", "pipe:0", "-f", "null", "-"]}}
//! {"payload": [0, 1, 2, 3]}
//! {"payload": "text is written as UTF-8"}
//! {"action": {"command": "stop", "signal": "SIGINT"}}
//! ```
//!
//! Each emission is printed as one line:
//! `{"port":0,"topic":"status","payload":{"status":"spawn","pid":1234}}`.

use std::io::BufRead;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::command::{Command, Filenames, InboundMessage};
use crate::engine::{Emission, SupervisorHandle};

/// Wire shape of an inbound line, before it becomes an `InboundMessage`.
#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    payload: Option<Value>,
    #[serde(default)]
    action: Option<Value>,
    #[serde(default)]
    filename: Option<Filenames>,
}

/// Decode one inbound JSON line.
///
/// - `payload` may be a byte array or a string; anything else is ignored.
/// - An `action` with an unknown or malformed command is logged and
///   ignored; the rest of the message is still delivered.
pub fn decode_line(line: &str) -> Result<InboundMessage> {
    let wire: WireMessage =
        serde_json::from_str(line).with_context(|| format!("decoding inbound line {line:?}"))?;

    let payload = wire.payload.and_then(payload_bytes);

    let action = match wire.action {
        Some(Value::Null) | None => None,
        Some(value) => match serde_json::from_value::<Command>(value.clone()) {
            Ok(command) => Some(command),
            Err(e) => {
                warn!(action = %value, error = %e, "unknown command; ignoring action");
                None
            }
        },
    };

    Ok(InboundMessage {
        payload,
        action,
        filename: wire.filename,
    })
}

fn payload_bytes(value: Value) -> Option<Vec<u8>> {
    match value {
        Value::String(s) => Some(s.into_bytes()),
        Value::Array(items) => {
            let bytes: Option<Vec<u8>> = items
                .iter()
                .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
                .collect();
            if bytes.is_none() {
                debug!("payload array holds values outside 0..=255; ignoring");
            }
            bytes
        }
        Value::Null => None,
        other => {
            debug!(payload = %other, "non-byte payload; ignoring");
            None
        }
    }
}

/// Encode one emission as a JSON line (without the trailing newline).
pub fn encode_emission(emission: &Emission) -> Result<String> {
    serde_json::to_string(emission).context("encoding emission")
}

/// Read lines from a blocking reader on a dedicated thread.
///
/// A plain thread (rather than a Tokio blocking task) is used so that a
/// pending read never holds up runtime shutdown.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(64);

    std::thread::spawn(move || {
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to read inbound line");
                    break;
                }
            }
        }
    });

    rx
}

/// Forward inbound lines to the supervisor until the input ends.
pub async fn pump_inbound(
    mut lines: mpsc::Receiver<String>,
    handle: SupervisorHandle,
) -> Result<()> {
    while let Some(line) = lines.recv().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match decode_line(line) {
            Ok(message) => handle.send(message).await?,
            Err(e) => warn!(error = %e, "dropping malformed inbound line"),
        }
    }

    debug!("inbound stream ended");
    Ok(())
}

/// Print emissions as JSON lines until the supervisor goes away.
pub async fn pump_outbound<W>(mut emissions: mpsc::Receiver<Emission>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(emission) = emissions.recv().await {
        let mut line = encode_emission(&emission)?;
        line.push('\n');
        writer
            .write_all(line.as_bytes())
            .await
            .context("writing emission")?;
        writer.flush().await.context("flushing emission")?;
    }

    Ok(())
}

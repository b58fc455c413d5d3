// src/config/validate.rs

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::command::args::{json_or_passthrough, substitute_secret};
use crate::command::validate::{validate_args, validate_outputs, validate_path, validate_topics};
use crate::config::model::{
    default_cmd_args, ConfigFile, RawConfigFile, RawSupervisorSection, SupervisorSettings,
    DEFAULT_ESCALATION_TIMEOUT, DEFAULT_OUTPUTS_MAX, DEFAULT_TOOL, OUTPUTS_MAX_CEILING,
};
use crate::errors::{PipevisorError, Result};
use crate::types::{DeliveryMode, KillSignal};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::PipevisorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let supervisor = validate_supervisor_section(raw.supervisor)?;
        Ok(ConfigFile::new_unchecked(supervisor))
    }
}

fn validate_supervisor_section(raw: RawSupervisorSection) -> Result<SupervisorSettings> {
    let tool = match raw.tool.as_deref().map(str::trim) {
        Some("") => {
            return Err(PipevisorError::ConfigError(
                "[supervisor].tool must not be empty".to_string(),
            ));
        }
        Some(t) => t.to_string(),
        None => DEFAULT_TOOL.to_string(),
    };

    let cmd_path = match raw.cmd_path.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => validate_path(p, &tool)?,
        _ => tool.clone(),
    };

    let mut cmd_args = match raw.cmd_args {
        Some(Value::String(s)) if s.trim().is_empty() => default_cmd_args(),
        Some(Value::String(s)) => validate_args(&json_or_passthrough(&s))?,
        Some(value) => validate_args(&value)?,
        None => default_cmd_args(),
    };

    let outputs_max = resolve_outputs_max(raw.outputs_max)?;

    let cmd_outputs = match raw.cmd_outputs {
        Some(value) => validate_outputs(&value, outputs_max)?,
        None => 2,
    };

    let kill_signal = match raw.kill_signal.as_deref() {
        Some(s) => s
            .parse::<KillSignal>()
            .map_err(|e| PipevisorError::ConfigError(format!("[supervisor].kill_signal: {e}")))?,
        None => KillSignal::default(),
    };

    let topics = match (&raw.topics, raw.delivery) {
        (Some(value), DeliveryMode::Combined) => Some(validate_topics(value, cmd_outputs)?),
        (Some(_), DeliveryMode::Split) => {
            warn!("[supervisor].topics is ignored with split delivery");
            None
        }
        (None, _) => None,
    };

    if let Some(secret) = raw.secret.as_deref() {
        if substitute_secret(&mut cmd_args, secret) {
            debug!("substituted secret into command args");
        }
    }

    let escalation_timeout = match raw.escalation_timeout_ms {
        Some(0) => {
            return Err(PipevisorError::ConfigError(
                "[supervisor].escalation_timeout_ms must be >= 1 (got 0)".to_string(),
            ));
        }
        Some(ms) => Duration::from_millis(ms),
        None => DEFAULT_ESCALATION_TIMEOUT,
    };

    Ok(SupervisorSettings {
        tool,
        cmd_path,
        cmd_args,
        cmd_outputs,
        outputs_max,
        kill_signal,
        delivery: raw.delivery,
        topics,
        topic_prefix: raw.topic_prefix,
        escalation_timeout,
    })
}

/// The maximum may only be raised; smaller values fall back to the default.
fn resolve_outputs_max(requested: Option<usize>) -> Result<usize> {
    match requested {
        Some(n) if n > OUTPUTS_MAX_CEILING => Err(PipevisorError::ConfigError(format!(
            "[supervisor].outputs_max must be <= {OUTPUTS_MAX_CEILING} (got {n})"
        ))),
        Some(n) if n > DEFAULT_OUTPUTS_MAX => Ok(n),
        Some(n) => {
            if n != DEFAULT_OUTPUTS_MAX {
                warn!(
                    requested = n,
                    default = DEFAULT_OUTPUTS_MAX,
                    "[supervisor].outputs_max below default; using default"
                );
            }
            Ok(DEFAULT_OUTPUTS_MAX)
        }
        None => Ok(DEFAULT_OUTPUTS_MAX),
    }
}

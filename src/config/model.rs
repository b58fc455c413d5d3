// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::types::{DeliveryMode, KillSignal};

/// Default tool name the executable path must mention.
pub const DEFAULT_TOOL: &str = "ffmpeg";

/// Lower bound (and default) for the configurable output-channel maximum.
pub const DEFAULT_OUTPUTS_MAX: usize = 5;

/// Hard ceiling on `outputs_max`; extra pipes are placed on fds below this.
pub const OUTPUTS_MAX_CEILING: usize = 64;

/// Default wait between a graceful stop and the forced kill.
pub const DEFAULT_ESCALATION_TIMEOUT: Duration = Duration::from_millis(2000);

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [supervisor]
/// cmd_path = "/usr/bin/ffmpeg"
/// cmd_args = ["-i", "pipe:0", "-f", "mp4", "pipe:1"]
/// cmd_outputs = 2
/// kill_signal = "SIGINT"
/// delivery = "split"
/// ```
///
/// All keys are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub supervisor: RawSupervisorSection,
}

/// `[supervisor]` section, loosely typed so the command validator gets to
/// judge every value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSupervisorSection {
    /// Tool name the executable path must contain (default `ffmpeg`).
    #[serde(default)]
    pub tool: Option<String>,

    /// Executable path; defaults to the tool name itself (resolved via PATH).
    #[serde(default)]
    pub cmd_path: Option<String>,

    /// Either an array of strings, or a string holding a JSON array.
    #[serde(default)]
    pub cmd_args: Option<Value>,

    #[serde(default)]
    pub cmd_outputs: Option<Value>,

    /// Raise the output-channel maximum above the default of 5.
    #[serde(default)]
    pub outputs_max: Option<usize>,

    #[serde(default)]
    pub kill_signal: Option<String>,

    #[serde(default)]
    pub delivery: DeliveryMode,

    /// Default topic overrides (combined delivery only).
    #[serde(default)]
    pub topics: Option<Value>,

    #[serde(default)]
    pub topic_prefix: String,

    /// Replaces a literal `SECRET` argument in `cmd_args`.
    #[serde(default)]
    pub secret: Option<String>,

    #[serde(default)]
    pub escalation_timeout_ms: Option<u64>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub supervisor: SupervisorSettings,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(supervisor: SupervisorSettings) -> Self {
        Self { supervisor }
    }
}

/// Instance defaults for one supervisor, resolved once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorSettings {
    pub tool: String,
    pub cmd_path: String,
    pub cmd_args: Vec<String>,
    pub cmd_outputs: usize,
    pub outputs_max: usize,
    pub kill_signal: KillSignal,
    pub delivery: DeliveryMode,
    pub topics: Option<Vec<String>>,
    pub topic_prefix: String,
    pub escalation_timeout: Duration,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            cmd_path: DEFAULT_TOOL.to_string(),
            cmd_args: default_cmd_args(),
            cmd_outputs: 2,
            outputs_max: DEFAULT_OUTPUTS_MAX,
            kill_signal: KillSignal::default(),
            delivery: DeliveryMode::default(),
            topics: None,
            topic_prefix: String::new(),
            escalation_timeout: DEFAULT_ESCALATION_TIMEOUT,
        }
    }
}

pub(crate) fn default_cmd_args() -> Vec<String> {
    vec!["-version".to_string()]
}

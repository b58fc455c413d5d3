#![allow(dead_code)]

use std::time::Duration;

use pipevisor::config::SupervisorSettings;
use pipevisor::types::{DeliveryMode, KillSignal};

/// Builder for `SupervisorSettings` to simplify test setup.
///
/// Defaults to running `/bin/sh` (tool `sh`) with two outputs, combined
/// delivery and a short escalation timeout.
pub struct SupervisorSettingsBuilder {
    settings: SupervisorSettings,
}

impl SupervisorSettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: SupervisorSettings {
                tool: "sh".to_string(),
                cmd_path: "/bin/sh".to_string(),
                cmd_args: vec!["-c".to_string(), "true".to_string()],
                cmd_outputs: 2,
                escalation_timeout: Duration::from_millis(500),
                ..SupervisorSettings::default()
            },
        }
    }

    /// Run `script` with `/bin/sh -c`.
    pub fn script(mut self, script: &str) -> Self {
        self.settings.cmd_args = vec!["-c".to_string(), script.to_string()];
        self
    }

    pub fn tool(mut self, tool: &str) -> Self {
        self.settings.tool = tool.to_string();
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.settings.cmd_path = path.to_string();
        self
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.settings.cmd_args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn outputs(mut self, outputs: usize) -> Self {
        self.settings.cmd_outputs = outputs;
        self
    }

    pub fn outputs_max(mut self, max: usize) -> Self {
        self.settings.outputs_max = max;
        self
    }

    pub fn delivery(mut self, delivery: DeliveryMode) -> Self {
        self.settings.delivery = delivery;
        self
    }

    pub fn kill_signal(mut self, signal: KillSignal) -> Self {
        self.settings.kill_signal = signal;
        self
    }

    pub fn topics(mut self, topics: &[&str]) -> Self {
        self.settings.topics = Some(topics.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn topic_prefix(mut self, prefix: &str) -> Self {
        self.settings.topic_prefix = prefix.to_string();
        self
    }

    pub fn escalation_timeout(mut self, timeout: Duration) -> Self {
        self.settings.escalation_timeout = timeout;
        self
    }

    pub fn build(self) -> SupervisorSettings {
        self.settings
    }
}

impl Default for SupervisorSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

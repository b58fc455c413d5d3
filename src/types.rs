// src/types.rs

//! Small shared enums used across config, commands and the engine.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Signals the supervisor is allowed to send to its process.
///
/// Only this subset is accepted from inbound commands and config; anything
/// else falls back to the configured default kill signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KillSignal {
    Hup,
    Int,
    Kill,
    Term,
}

impl KillSignal {
    pub const ALL: [KillSignal; 4] = [
        KillSignal::Hup,
        KillSignal::Int,
        KillSignal::Kill,
        KillSignal::Term,
    ];

    /// Conventional `SIGxxx` name.
    pub fn name(self) -> &'static str {
        match self {
            KillSignal::Hup => "SIGHUP",
            KillSignal::Int => "SIGINT",
            KillSignal::Kill => "SIGKILL",
            KillSignal::Term => "SIGTERM",
        }
    }

    /// Resolve an optional requested signal name against the supported set,
    /// falling back to `default` when absent or unsupported.
    pub fn resolve(requested: Option<&str>, default: KillSignal) -> KillSignal {
        requested
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }
}

impl Default for KillSignal {
    fn default() -> Self {
        KillSignal::Term
    }
}

impl fmt::Display for KillSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KillSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SIGHUP" => Ok(KillSignal::Hup),
            "SIGINT" => Ok(KillSignal::Int),
            "SIGKILL" => Ok(KillSignal::Kill),
            "SIGTERM" => Ok(KillSignal::Term),
            other => Err(format!(
                "unsupported signal: {other} (expected SIGHUP, SIGINT, SIGKILL or SIGTERM)"
            )),
        }
    }
}

impl<'de> Deserialize<'de> for KillSignal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// How channel output is delivered to the host.
///
/// - `Split`: each output channel gets its own numbered port (its channel
///   index); topic overrides are not honoured.
/// - `Combined`: every channel shares port 0 and is told apart by topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    Split,
    Combined,
}

impl Default for DeliveryMode {
    fn default() -> Self {
        DeliveryMode::Combined
    }
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "split" => Ok(DeliveryMode::Split),
            "combined" => Ok(DeliveryMode::Combined),
            other => Err(format!(
                "invalid delivery mode: {other} (expected \"split\" or \"combined\")"
            )),
        }
    }
}

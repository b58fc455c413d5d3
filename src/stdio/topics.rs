// src/stdio/topics.rs

//! Topic namer: stable labels for channel indices.

use serde_json::Value;
use tracing::warn;

use crate::command::validate::validate_topics;
use crate::errors::Result;
use crate::types::DeliveryMode;

/// Topic of lifecycle messages; always bound to index 0.
pub const STATUS_TOPIC: &str = "status";

/// Default label for channel `index`.
pub fn default_topic(index: usize) -> String {
    match index {
        0 => STATUS_TOPIC.to_string(),
        1 => "stdout".to_string(),
        2 => "stderr".to_string(),
        i => format!("stdio{i}"),
    }
}

/// Topics for one run, indexed by channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSet {
    topics: Vec<String>,
}

impl TopicSet {
    /// Default names for `outputs` channels: `[status, stdout, ...]`.
    pub fn defaults(outputs: usize) -> Self {
        Self {
            topics: (0..=outputs).map(default_topic).collect(),
        }
    }

    /// Resolve the topic list for a run.
    ///
    /// Overrides are only honoured in combined delivery; split delivery
    /// identifies channels by port, so overrides are ignored there.
    /// `prefix` is prepended to every resulting topic.
    pub fn resolve(
        outputs: usize,
        overrides: Option<&Value>,
        delivery: DeliveryMode,
        prefix: &str,
    ) -> Result<Self> {
        let base = match (overrides, delivery) {
            (Some(value), DeliveryMode::Combined) => {
                let mut topics = vec![STATUS_TOPIC.to_string()];
                topics.extend(validate_topics(value, outputs)?);
                Self { topics }
            }
            (Some(_), DeliveryMode::Split) => {
                warn!("topic overrides are ignored in split delivery mode");
                Self::defaults(outputs)
            }
            (None, _) => Self::defaults(outputs),
        };

        Ok(base.with_prefix(prefix))
    }

    fn with_prefix(self, prefix: &str) -> Self {
        if prefix.is_empty() {
            return self;
        }
        Self {
            topics: self
                .topics
                .into_iter()
                .map(|t| format!("{prefix}{t}"))
                .collect(),
        }
    }

    pub fn status(&self) -> &str {
        &self.topics[0]
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.topics.get(index).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.topics
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

// src/engine/router.rs

//! Pure routing of channel output into outbound emissions.

use crate::engine::{Emission, OutboundMessage, Payload, StatusPayload};
use crate::stdio::{ChannelRole, StdioPlan, TopicSet};
use crate::types::DeliveryMode;

/// Per-run routing table: topics, filenames and delivery mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Router {
    plan: StdioPlan,
    topics: TopicSet,
    filenames: Vec<String>,
    delivery: DeliveryMode,
}

impl Router {
    pub fn new(
        plan: StdioPlan,
        topics: TopicSet,
        filenames: Vec<String>,
        delivery: DeliveryMode,
    ) -> Self {
        Self {
            plan,
            topics,
            filenames,
            delivery,
        }
    }

    pub fn topics(&self) -> &TopicSet {
        &self.topics
    }

    /// Emission for a chunk read from output channel `index`.
    ///
    /// Returns `None` for the input channel or channels that are not piped.
    pub fn route(&self, index: usize, data: Vec<u8>) -> Option<Emission> {
        if index == 0 || self.plan.role(index) != Some(ChannelRole::Pipe) {
            return None;
        }
        let topic = self.topics.get(index)?.to_string();

        let port = match self.delivery {
            DeliveryMode::Split => index,
            DeliveryMode::Combined => 0,
        };

        Some(Emission {
            port,
            message: OutboundMessage {
                topic,
                payload: Payload::Data(data),
                filename: self
                    .filenames
                    .get(index - 1)
                    .filter(|name| !name.is_empty())
                    .cloned(),
            },
        })
    }

    /// Lifecycle emission on the status topic (always port 0).
    pub fn status(&self, status: StatusPayload) -> Emission {
        status_emission(self.topics.status(), status)
    }
}

/// Status emission outside of a run (e.g. before a router exists).
pub fn status_emission(topic: &str, status: StatusPayload) -> Emission {
    Emission {
        port: 0,
        message: OutboundMessage {
            topic: topic.to_string(),
            payload: Payload::Status(status),
            filename: None,
        },
    }
}

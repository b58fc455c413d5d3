// src/stdio/mod.rs

//! Channel topology for a run.
//!
//! - [`plan`] decides which process channels are piped vs. discarded.
//! - [`topics`] names each channel for outbound messages.

pub mod plan;
pub mod topics;

pub use plan::{ChannelRole, StdioPlan};
pub use topics::{default_topic, TopicSet, STATUS_TOPIC};

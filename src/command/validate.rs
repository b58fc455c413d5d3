// src/command/validate.rs

//! Command validator.
//!
//! Pure checks over the loosely-typed values that arrive from config files
//! and inbound messages. Each check either returns the strongly-typed value
//! or the matching validation error; none of them have side effects.

use std::collections::HashSet;

use serde_json::Value;

use crate::errors::{PipevisorError, Result};
use crate::stdio::topics::STATUS_TOPIC;

/// Executable path must mention the expected tool (case-insensitive).
///
/// Returns the trimmed path on success.
pub fn validate_path(path: &str, tool: &str) -> Result<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() || !trimmed.to_lowercase().contains(&tool.to_lowercase()) {
        return Err(PipevisorError::InvalidPath(format!(
            "'{path}' does not look like a {tool} executable"
        )));
    }
    Ok(trimmed.to_string())
}

/// Arguments must be a list of discrete string tokens.
///
/// A single opaque string (e.g. `"-i in.mp4 out.mp4"`) is rejected.
pub fn validate_args(args: &Value) -> Result<Vec<String>> {
    let items = args.as_array().ok_or_else(|| {
        PipevisorError::InvalidArgs(format!("expected an array of strings, got {args}"))
    })?;

    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                PipevisorError::InvalidArgs(format!("argument {item} is not a string"))
            })
        })
        .collect()
}

/// Output count must be an integer in `0..=max`.
pub fn validate_outputs(outputs: &Value, max: usize) -> Result<usize> {
    let invalid = || {
        PipevisorError::InvalidOutputCount(format!(
            "expected an integer between 0 and {max}, got {outputs}"
        ))
    };

    let n = outputs.as_u64().ok_or_else(invalid)?;
    let n = usize::try_from(n).map_err(|_| invalid())?;
    if n > max {
        return Err(invalid());
    }
    Ok(n)
}

/// Topic overrides must be exactly `outputs` unique strings, none of which is
/// the reserved status topic.
pub fn validate_topics(topics: &Value, outputs: usize) -> Result<Vec<String>> {
    let items = topics.as_array().ok_or_else(|| {
        PipevisorError::InvalidTopics(format!("expected an array of strings, got {topics}"))
    })?;

    if items.len() != outputs {
        return Err(PipevisorError::InvalidTopics(format!(
            "expected {outputs} topics, got {}",
            items.len()
        )));
    }

    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(items.len());

    for item in items {
        let topic = item.as_str().ok_or_else(|| {
            PipevisorError::InvalidTopics(format!("topic {item} is not a string"))
        })?;

        if topic == STATUS_TOPIC {
            return Err(PipevisorError::InvalidTopics(format!(
                "'{STATUS_TOPIC}' is reserved for lifecycle messages"
            )));
        }

        if !seen.insert(topic) {
            return Err(PipevisorError::InvalidTopics(format!(
                "duplicate topic '{topic}'"
            )));
        }

        resolved.push(topic.to_string());
    }

    Ok(resolved)
}

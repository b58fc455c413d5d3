// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipevisorError {
    #[error("Invalid command path: {0}")]
    InvalidPath(String),

    #[error("Invalid command args: {0}")]
    InvalidArgs(String),

    #[error("Invalid output count: {0}")]
    InvalidOutputCount(String),

    #[error("Invalid topics: {0}")]
    InvalidTopics(String),

    #[error("Failed to spawn process: {0}")]
    SpawnFailure(String),

    #[error("Failed to write to process input: {0}")]
    ChannelWriteFailure(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipevisorError {
    /// True for the synchronous validation failures raised before any
    /// process exists.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PipevisorError::InvalidPath(_)
                | PipevisorError::InvalidArgs(_)
                | PipevisorError::InvalidOutputCount(_)
                | PipevisorError::InvalidTopics(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipevisorError>;

// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `pipevisor`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pipevisor",
    version,
    about = "Supervise one external process and bridge its stdio as JSON lines.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Pipevisor.toml` in the current working directory. A missing
    /// file means built-in defaults are used.
    #[arg(long, value_name = "PATH", default_value = "Pipevisor.toml")]
    pub config: String,

    /// Start the configured command immediately instead of waiting for a
    /// `start` message.
    #[arg(long)]
    pub autostart: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIPEVISOR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate config, print it, but don't spawn anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

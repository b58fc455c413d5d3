// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the supervised command,
//! using `tokio::process::Command`, and reporting back to the supervisor
//! runtime via `ProcessEvent`s.
//!
//! - [`process`] spawns the process and owns its writer / watcher tasks.
//! - [`router`] contains the per-channel reader tasks of the stream router.
//! - [`pipes`] plumbs extra output pipes onto fds 3 and up.
//! - [`signals`] implements liveness-probed signalling.
//! - [`backend`] provides the `ProcessBackend` trait and a concrete
//!   `RealProcessBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.

pub mod backend;
pub mod pipes;
pub mod process;
pub mod router;
pub mod signals;

pub use backend::{ProcessBackend, RealProcessBackend};
pub use process::{spawn_process, ProcessHandle};

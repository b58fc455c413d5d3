// src/exec/pipes.rs

//! Extra output pipes on fds 3 and up.
//!
//! `tokio::process::Command` only wires stdin/stdout/stderr, so channels
//! beyond index 2 are plumbed by hand:
//!
//! 1. In the parent, a `O_CLOEXEC` pipe is created per extra channel and the
//!    write end is re-numbered above [`HIGH_FD_BASE`] so it cannot collide
//!    with any target fd.
//! 2. Target fds that are free in the parent are temporarily reserved, so
//!    nothing else `Command::spawn` opens (e.g. its exec-error pipe) lands on
//!    them.
//! 3. In the child, a `pre_exec` hook `dup2`s each write end onto its target
//!    fd (which clears `FD_CLOEXEC` on the copy).
//! 4. After spawn, the parent drops its write ends and reservations and
//!    keeps only the read ends.

// Allow unsafe code for this module since fd plumbing requires libc calls
#![allow(unsafe_code)]

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use nix::fcntl::OFlag;
use nix::unistd::pipe2;
use tokio::process::Command;
use tracing::debug;

/// Write ends are moved to fds at or above this number.
pub const HIGH_FD_BASE: RawFd = 128;

/// Pipes for every channel index >= 3 of one spawn.
#[derive(Debug, Default)]
pub struct ExtraPipes {
    /// (channel index, read end kept by the parent)
    readers: Vec<(usize, OwnedFd)>,
    /// (write end above HIGH_FD_BASE, target fd in the child)
    writers: Vec<(OwnedFd, RawFd)>,
    reservations: Vec<OwnedFd>,
}

impl ExtraPipes {
    /// Create one pipe per channel index in `indices` (each >= 3).
    pub fn create(indices: impl IntoIterator<Item = usize>) -> io::Result<Self> {
        let mut pipes = ExtraPipes::default();

        for index in indices {
            let (read, write) = pipe2(OFlag::O_CLOEXEC).map_err(io::Error::from)?;
            let high = dup_cloexec_at_least(write.as_raw_fd(), HIGH_FD_BASE)?;
            drop(write);

            pipes.readers.push((index, read));
            pipes.writers.push((high, index as RawFd));
        }

        for &(_, target) in &pipes.writers {
            if let Some(reserved) = reserve_fd(target)? {
                pipes.reservations.push(reserved);
            }
        }

        Ok(pipes)
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }

    /// Install the `dup2` hook on `cmd`.
    pub fn install(&self, cmd: &mut Command) {
        if self.is_empty() {
            return;
        }

        let mapping: Vec<(RawFd, RawFd)> = self
            .writers
            .iter()
            .map(|(fd, target)| (fd.as_raw_fd(), *target))
            .collect();

        debug!(?mapping, "installing extra output pipes");

        // Safety: dup2 is async-signal-safe and the closure does not
        // allocate; `mapping` is moved in before fork.
        unsafe {
            cmd.pre_exec(move || {
                for &(src, dst) in &mapping {
                    if libc::dup2(src, dst) == -1 {
                        return Err(io::Error::last_os_error());
                    }
                }
                Ok(())
            });
        }
    }

    /// Close the parent's write ends and reservations; return the read ends.
    pub fn into_readers(self) -> Vec<(usize, OwnedFd)> {
        drop(self.writers);
        drop(self.reservations);
        self.readers
    }
}

/// Duplicate `fd` onto the lowest free fd >= `min`, with `FD_CLOEXEC` set.
fn dup_cloexec_at_least(fd: RawFd, min: RawFd) -> io::Result<OwnedFd> {
    // Safety: fcntl with F_DUPFD_CLOEXEC only returns a fresh fd we own.
    let new_fd = unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, min) };
    if new_fd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { OwnedFd::from_raw_fd(new_fd) })
}

/// Occupy `target` in the parent if it is currently free.
fn reserve_fd(target: RawFd) -> io::Result<Option<OwnedFd>> {
    // Safety: F_GETFD only inspects the descriptor table.
    if unsafe { libc::fcntl(target, libc::F_GETFD) } != -1 {
        return Ok(None);
    }

    let placeholder = OwnedFd::from(std::fs::File::open("/dev/null")?);
    if placeholder.as_raw_fd() == target {
        return Ok(Some(placeholder));
    }

    let fd = dup_cloexec_at_least(placeholder.as_raw_fd(), target)?;
    if fd.as_raw_fd() == target {
        Ok(Some(fd))
    } else {
        // Someone else took it in between; the child's dup2 replaces it anyway.
        Ok(None)
    }
}

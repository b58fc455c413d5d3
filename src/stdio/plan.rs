// src/stdio/plan.rs

//! Stdio planner: which channels of the process are piped.

/// Role of one channel of the spawned process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    /// Connected to the supervisor through a pipe.
    Pipe,
    /// Connected to the null device.
    Discard,
}

/// Ordered channel roles; index 0 is the process input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdioPlan {
    roles: Vec<ChannelRole>,
}

impl StdioPlan {
    /// Derive the plan for `outputs` readable channels.
    ///
    /// | outputs | plan                      |
    /// |---------|---------------------------|
    /// | 0       | pipe, discard, discard    |
    /// | 1       | pipe, pipe, discard       |
    /// | n >= 2  | pipe × (n + 1)            |
    ///
    /// Indices 1 and 2 (stdout / stderr) are always present; further
    /// channels are extra pipes on fd 3 and up.
    pub fn for_outputs(outputs: usize) -> Self {
        let mut roles = vec![ChannelRole::Pipe];

        match outputs {
            0 => roles.extend([ChannelRole::Discard, ChannelRole::Discard]),
            1 => roles.extend([ChannelRole::Pipe, ChannelRole::Discard]),
            n => roles.extend(std::iter::repeat_n(ChannelRole::Pipe, n)),
        }

        Self { roles }
    }

    pub fn roles(&self) -> &[ChannelRole] {
        &self.roles
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn role(&self, index: usize) -> Option<ChannelRole> {
        self.roles.get(index).copied()
    }

    /// Indices (>= 1) of the readable channels that are piped.
    pub fn piped_outputs(&self) -> impl Iterator<Item = usize> + '_ {
        self.roles
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, role)| **role == ChannelRole::Pipe)
            .map(|(i, _)| i)
    }

    /// Indices >= 3 that need an extra pipe beyond stdin/stdout/stderr.
    pub fn extra_fds(&self) -> impl Iterator<Item = usize> + '_ {
        self.piped_outputs().filter(|i| *i >= 3)
    }
}

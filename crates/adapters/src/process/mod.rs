// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job process adapters
//!
//! Every job runs as the leader of its own process group, so the whole tree
//! can be signalled with `killpg`. Handles are identified by the leader pid.

mod host;

pub use host::HostProcessAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcess, FakeProcessAdapter, ProcessCall};

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors from process operations
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("cannot prepare output file {path}: {source}")]
    OutputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no process handle for pid {0}")]
    UnknownProcess(u32),
    #[error("failed to signal process group {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: nix::Error,
    },
    #[error("failed to wait for pid {pid}: {source}")]
    Wait {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
}

/// Everything needed to start one job process.
///
/// `program` and `args` are the final argv; any identity or container
/// wrapper has already been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    /// Start from an empty environment instead of inheriting the daemon's.
    pub clear_env: bool,
    pub cwd: PathBuf,
    /// Receives both stdout and stderr; created or truncated.
    pub output: PathBuf,
    /// Hand the output file to this uid after creating it.
    pub output_owner: Option<u32>,
}

/// Observed state of a launched process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    /// The leader exited and has been reaped; `code` is `None` when it was
    /// killed by a signal.
    Exited { code: Option<i32> },
}

/// Adapter for launching and supervising job process trees
#[async_trait]
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    /// Start a process in a new process group and return its pid.
    async fn spawn(&self, spec: &LaunchSpec) -> Result<u32, ProcessError>;

    /// Check the leader without blocking.
    ///
    /// On exit the handle is released and any processes left in the group
    /// are sent `SIGKILL`.
    async fn poll(&self, pid: u32) -> Result<ProcessState, ProcessError>;

    /// `SIGTERM` the group, give the leader `grace` to exit, `SIGKILL` the
    /// group, then reap the leader and release the handle.
    async fn kill_tree(&self, pid: u32, grace: Duration) -> Result<(), ProcessError>;
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host process adapter backed by `tokio::process`.

use super::{LaunchSpec, ProcessAdapter, ProcessError, ProcessState};
use crate::env;
use async_trait::async_trait;
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};

/// Launches jobs as real child processes of the daemon.
#[derive(Clone, Default)]
pub struct HostProcessAdapter {
    children: Arc<Mutex<HashMap<u32, Child>>>,
}

impl HostProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles not yet released.
    pub fn live_handles(&self) -> usize {
        self.children.lock().len()
    }
}

#[async_trait]
impl ProcessAdapter for HostProcessAdapter {
    async fn spawn(&self, spec: &LaunchSpec) -> Result<u32, ProcessError> {
        let stdout = open_output(&spec.output, spec.output_owner)?;
        let stderr = stdout
            .try_clone()
            .map_err(|source| ProcessError::OutputFile {
                path: spec.output.clone(),
                source,
            })?;

        let mut cmd = Command::new(&spec.program);
        if spec.clear_env {
            cmd.env_clear();
        }
        cmd.args(&spec.args)
            .envs(&spec.env)
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .process_group(0);

        let spawn_error = |source| ProcessError::Spawn {
            program: spec.program.clone(),
            source,
        };
        let child = cmd.spawn().map_err(spawn_error)?;
        let pid = child.id().ok_or_else(|| {
            spawn_error(std::io::Error::other("child exited before its pid was read"))
        })?;
        self.children.lock().insert(pid, child);
        Ok(pid)
    }

    async fn poll(&self, pid: u32) -> Result<ProcessState, ProcessError> {
        let status = {
            let mut children = self.children.lock();
            let child = children
                .get_mut(&pid)
                .ok_or(ProcessError::UnknownProcess(pid))?;
            match child.try_wait() {
                Ok(None) => return Ok(ProcessState::Running),
                Ok(Some(status)) => {
                    children.remove(&pid);
                    status
                }
                Err(source) => return Err(ProcessError::Wait { pid, source }),
            }
        };
        // Stragglers the leader left behind in its group.
        signal_group(pid, Signal::SIGKILL)?;
        Ok(ProcessState::Exited {
            code: status.code(),
        })
    }

    async fn kill_tree(&self, pid: u32, grace: Duration) -> Result<(), ProcessError> {
        let mut child = self
            .children
            .lock()
            .remove(&pid)
            .ok_or(ProcessError::UnknownProcess(pid))?;

        signal_group(pid, Signal::SIGTERM)?;
        let deadline = Instant::now() + grace;
        let poll = env::kill_poll_interval();
        while Instant::now() < deadline {
            match child.try_wait() {
                Ok(None) => tokio::time::sleep(poll).await,
                Ok(Some(_)) | Err(_) => break,
            }
        }
        signal_group(pid, Signal::SIGKILL)?;
        child
            .wait()
            .await
            .map_err(|source| ProcessError::Wait { pid, source })?;
        Ok(())
    }
}

/// Signal every process in the group led by `pid`. An empty group is fine.
fn signal_group(pid: u32, signal: Signal) -> Result<(), ProcessError> {
    match killpg(Pid::from_raw(pid as i32), signal) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(source) => Err(ProcessError::Signal { pid, source }),
    }
}

/// Create or truncate the job's output file without following a symlink at
/// that path, then give it to `owner`.
fn open_output(path: &Path, owner: Option<u32>) -> Result<File, ProcessError> {
    let err = |source| ProcessError::OutputFile {
        path: path.to_path_buf(),
        source,
    };
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o644)
        .custom_flags(OFlag::O_NOFOLLOW.bits())
        .open(path)
        .map_err(err)?;
    if let Some(uid) = owner {
        std::os::unix::fs::fchown(&file, Some(uid), None).map_err(err)?;
    }
    Ok(file)
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LaunchSpec, ProcessAdapter, ProcessError, ProcessState};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Recorded process call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessCall {
    Spawn(LaunchSpec),
    Poll(u32),
    KillTree { pid: u32, grace: Duration },
}

/// Fake process state
#[derive(Debug, Clone)]
pub struct FakeProcess {
    pub spec: LaunchSpec,
    pub alive: bool,
    pub exit_code: Option<i32>,
    /// Set once the handle has been released by `poll` or `kill_tree`.
    pub reaped: bool,
    pub killed: bool,
}

struct FakeProcessState {
    processes: HashMap<u32, FakeProcess>,
    calls: Vec<ProcessCall>,
    next_pid: u32,
    spawn_error: Option<String>,
}

/// Fake process adapter for testing
#[derive(Clone)]
pub struct FakeProcessAdapter {
    inner: Arc<Mutex<FakeProcessState>>,
}

impl Default for FakeProcessAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeProcessState {
                processes: HashMap::new(),
                calls: Vec::new(),
                next_pid: 1000,
                spawn_error: None,
            })),
        }
    }
}

impl FakeProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ProcessCall> {
        self.inner.lock().calls.clone()
    }

    /// Launch specs in spawn order.
    pub fn spawns(&self) -> Vec<LaunchSpec> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ProcessCall::Spawn(spec) => Some(spec.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn get(&self, pid: u32) -> Option<FakeProcess> {
        self.inner.lock().processes.get(&pid).cloned()
    }

    /// Pids of processes that have not exited or been killed.
    pub fn alive_pids(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self
            .inner
            .lock()
            .processes
            .iter()
            .filter(|(_, p)| p.alive)
            .map(|(pid, _)| *pid)
            .collect();
        pids.sort_unstable();
        pids
    }

    /// Mark a process as exited; the next `poll` reports it.
    pub fn set_exited(&self, pid: u32, exit_code: i32) {
        if let Some(process) = self.inner.lock().processes.get_mut(&pid) {
            process.alive = false;
            process.exit_code = Some(exit_code);
        }
    }

    /// Make later spawns fail with this message (or succeed again with `None`).
    pub fn fail_spawns(&self, error: Option<&str>) {
        self.inner.lock().spawn_error = error.map(str::to_string);
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcessAdapter {
    async fn spawn(&self, spec: &LaunchSpec) -> Result<u32, ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::Spawn(spec.clone()));
        if let Some(message) = inner.spawn_error.clone() {
            return Err(ProcessError::Spawn {
                program: spec.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, message),
            });
        }
        let pid = inner.next_pid;
        inner.next_pid += 1;
        inner.processes.insert(
            pid,
            FakeProcess {
                spec: spec.clone(),
                alive: true,
                exit_code: None,
                reaped: false,
                killed: false,
            },
        );
        Ok(pid)
    }

    async fn poll(&self, pid: u32) -> Result<ProcessState, ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::Poll(pid));
        let process = inner
            .processes
            .get_mut(&pid)
            .filter(|p| !p.reaped)
            .ok_or(ProcessError::UnknownProcess(pid))?;
        if process.alive {
            return Ok(ProcessState::Running);
        }
        process.reaped = true;
        Ok(ProcessState::Exited {
            code: process.exit_code,
        })
    }

    async fn kill_tree(&self, pid: u32, grace: Duration) -> Result<(), ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::KillTree { pid, grace });
        let process = inner
            .processes
            .get_mut(&pid)
            .filter(|p| !p.reaped)
            .ok_or(ProcessError::UnknownProcess(pid))?;
        process.alive = false;
        process.killed = true;
        process.reaped = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;

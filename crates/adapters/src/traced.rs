// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::process::{LaunchSpec, ProcessAdapter, ProcessError, ProcessState};
use async_trait::async_trait;
use std::time::Duration;
use tracing::Instrument;

/// Wrapper that adds tracing to any ProcessAdapter
#[derive(Clone)]
pub struct TracedProcess<P> {
    inner: P,
}

impl<P> TracedProcess<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: ProcessAdapter> ProcessAdapter for TracedProcess<P> {
    async fn spawn(&self, spec: &LaunchSpec) -> Result<u32, ProcessError> {
        async {
            tracing::info!(args = ?spec.args, env_count = spec.env.len(), "starting");
            let start = std::time::Instant::now();
            let result = self.inner.spawn(spec).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(pid) => tracing::info!(pid, elapsed_ms, "process started"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "spawn failed"),
            }
            result
        }
        .instrument(tracing::info_span!(
            "process.spawn",
            program = %spec.program,
            cwd = %spec.cwd.display()
        ))
        .await
    }

    async fn poll(&self, pid: u32) -> Result<ProcessState, ProcessError> {
        let result = self.inner.poll(pid).await;
        match &result {
            Ok(ProcessState::Running) => tracing::trace!(pid, "still running"),
            Ok(ProcessState::Exited { code }) => tracing::info!(pid, ?code, "process exited"),
            Err(e) => tracing::warn!(pid, error = %e, "poll failed"),
        }
        result
    }

    async fn kill_tree(&self, pid: u32, grace: Duration) -> Result<(), ProcessError> {
        let start = std::time::Instant::now();
        let result = self.inner.kill_tree(pid, grace).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info_span!("process.kill_tree", pid).in_scope(|| match &result {
            Ok(()) => tracing::info!(elapsed_ms, "process tree killed"),
            Err(e) => tracing::warn!(elapsed_ms, error = %e, "kill failed"),
        });
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;

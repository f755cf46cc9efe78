// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notifier that runs an external command with the message as its argument.

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Runs `<program> "<message>"` detached with all stdio closed.
///
/// The child is reaped on a background task; a non-zero exit is logged and
/// otherwise ignored.
#[derive(Clone, Debug)]
pub struct CommandNotifyAdapter {
    program: String,
}

impl CommandNotifyAdapter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl NotifyAdapter for CommandNotifyAdapter {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let mut child = Command::new(&self.program)
            .arg(message)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| NotifyError::SpawnFailed {
                program: self.program.clone(),
                source,
            })?;

        let program = self.program.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {
                    tracing::trace!(%program, "notifier finished");
                }
                Ok(status) => tracing::warn!(%program, %status, "notifier exited with failure"),
                Err(e) => tracing::warn!(%program, error = %e, "failed to wait for notifier"),
            }
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;

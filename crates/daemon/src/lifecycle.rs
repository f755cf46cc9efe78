// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: configuration, startup, and the single-instance lock.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use fs2::FileExt;
use gj_storage::{owner, Layout};
use thiserror::Error;
use tracing::warn;

use crate::env;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub layout: Layout,
    /// Scheduling period
    pub tick: Duration,
    /// Host core capacity used for admission
    pub cpu_cores: u32,
    /// Notifier program; `None` disables notifications
    pub notify_cmd: Option<String>,
    /// GPU discovery program; `None` means the host has no GPUs
    pub gpu_probe: Option<String>,
    /// machinectl container for `run_in_container` jobs
    pub container: String,
    pub finished_retention: Duration,
    pub gpu_refresh: Duration,
    pub lock_timeout: Duration,
    pub kill_grace: Duration,
    /// Effective uid of the daemon; jobs of other users go through `runuser`
    pub daemon_uid: u32,
}

impl Config {
    /// Load configuration from `GJ_*` environment variables.
    pub fn load() -> Result<Self, LifecycleError> {
        let cpu_cores = match env::cpu_cores() {
            Some(n) => u32::try_from(n)
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| LifecycleError::InvalidConfig(format!("GJ_CPU_CORES={n}")))?,
            None => detected_cores(),
        };
        let tick = env::tick_interval();
        if tick.is_zero() {
            return Err(LifecycleError::InvalidConfig("GJ_TICK_MS=0".to_string()));
        }

        Ok(Self {
            layout: Layout::new(env::root_dir()),
            tick,
            cpu_cores,
            notify_cmd: env::notify_cmd(),
            gpu_probe: env::gpu_probe(),
            container: env::container(),
            finished_retention: env::finished_retention(),
            gpu_refresh: env::gpu_refresh(),
            lock_timeout: env::lock_timeout(),
            kill_grace: env::kill_grace(),
            daemon_uid: owner::effective_uid(),
        })
    }

    /// Defaults rooted at `root`, independent of the environment.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: Layout::new(root),
            tick: Duration::from_secs(1),
            cpu_cores: detected_cores(),
            notify_cmd: None,
            gpu_probe: None,
            container: "ubuntu-22.04".to_string(),
            finished_retention: Duration::from_secs(60),
            gpu_refresh: Duration::from_secs(60),
            lock_timeout: Duration::from_millis(500),
            kill_grace: Duration::from_secs(2),
            daemon_uid: owner::effective_uid(),
        }
    }
}

fn detected_cores() -> u32 {
    std::thread::available_parallelism()
        .map(|n| u32::try_from(n.get()).unwrap_or(u32::MAX))
        .unwrap_or(1)
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Exclusive hold on `gjd.pid`, released on drop.
#[derive(Debug)]
pub struct PidLock {
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    file: File,
    path: PathBuf,
}

impl PidLock {
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Clear the recorded pid and release the lock.
    pub fn release(self) {
        if let Err(e) = self.file.set_len(0) {
            warn!(error = %e, "failed to clear pid file");
        }
        let _ = FileExt::unlock(&self.file);
    }
}

/// Prepare the shared directory tree and take the single-instance lock.
pub fn startup(config: &Config) -> Result<PidLock, LifecycleError> {
    config.layout.prepare()?;

    // Open without truncating so a running daemon's pid survives a failed attempt.
    let path = config.layout.pid_file();
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)?;
    file.try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(PidLock { file, path })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

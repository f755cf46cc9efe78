// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use gj_storage::DEFAULT_ROOT;
use std::path::PathBuf;
use std::time::Duration;

fn parse_u64(var: &str) -> Option<u64> {
    std::env::var(var).ok().and_then(|s| s.trim().parse().ok())
}

fn parse_duration_ms(var: &str) -> Option<Duration> {
    parse_u64(var).map(Duration::from_millis)
}

/// Shared root directory: GJ_ROOT > /tmp/gpujob
pub fn root_dir() -> PathBuf {
    std::env::var_os("GJ_ROOT")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT))
}

/// Scheduling period (default: 1000ms).
pub fn tick_interval() -> Duration {
    parse_duration_ms("GJ_TICK_MS").unwrap_or(Duration::from_secs(1))
}

/// Host core capacity override. `None` means use the detected parallelism.
pub fn cpu_cores() -> Option<u64> {
    parse_u64("GJ_CPU_CORES")
}

/// Notifier command (default: `notify`). Set to the empty string to disable.
pub fn notify_cmd() -> Option<String> {
    match std::env::var("GJ_NOTIFY_CMD") {
        Ok(cmd) if cmd.trim().is_empty() => None,
        Ok(cmd) => Some(cmd),
        Err(_) => Some("notify".to_string()),
    }
}

/// GPU discovery command (default: `nvidia-smi`). `none` disables discovery.
pub fn gpu_probe() -> Option<String> {
    match std::env::var("GJ_GPU_PROBE") {
        Ok(probe) if probe.trim().is_empty() || probe == "none" => None,
        Ok(probe) => Some(probe),
        Err(_) => Some("nvidia-smi".to_string()),
    }
}

/// Container used for `run_in_container` jobs (default: `ubuntu-22.04`).
pub fn container() -> String {
    std::env::var("GJ_CONTAINER")
        .ok()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| "ubuntu-22.04".to_string())
}

/// How long finished jobs stay visible (default: 60s).
pub fn finished_retention() -> Duration {
    parse_duration_ms("GJ_FINISHED_RETENTION_MS").unwrap_or(Duration::from_secs(60))
}

/// GPU inventory refresh period (default: 60s).
pub fn gpu_refresh() -> Duration {
    parse_duration_ms("GJ_GPU_REFRESH_MS").unwrap_or(Duration::from_secs(60))
}

/// Bounded wait for the inbox and outbox locks (default: 500ms).
pub fn lock_timeout() -> Duration {
    parse_duration_ms("GJ_LOCK_TIMEOUT_MS").unwrap_or(Duration::from_millis(500))
}

/// Time between SIGTERM and SIGKILL when cancelling (default: 2000ms).
pub fn kill_grace() -> Duration {
    parse_duration_ms("GJ_KILL_GRACE_MS").unwrap_or(Duration::from_secs(2))
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use gj_storage::DEFAULT_ROOT;
use std::path::PathBuf;
use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.trim().is_empty())
}

/// Shared root directory: GJ_ROOT > /tmp/gpujob
pub fn root_dir() -> PathBuf {
    non_empty("GJ_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT))
}

/// Bounded wait for the inbox and outbox locks (default: 5s).
pub fn lock_timeout() -> Duration {
    parse_duration_ms("GJ_LOCK_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// Poll period for `gj wait` (default: 1s).
pub fn wait_poll() -> Duration {
    parse_duration_ms("GJ_WAIT_POLL_MS").unwrap_or(Duration::from_secs(1))
}

pub const DEFAULT_VASP_LAUNCHER: &str = "/usr/local/libexec/gpujob/vasp";
pub const DEFAULT_LAMMPS_LAUNCHER: &str = "/usr/local/libexec/gpujob/lammps";

pub fn vasp_launcher() -> String {
    non_empty("GJ_VASP_LAUNCHER").unwrap_or_else(|| DEFAULT_VASP_LAUNCHER.to_string())
}

pub fn lammps_launcher() -> String {
    non_empty("GJ_LAMMPS_LAUNCHER").unwrap_or_else(|| DEFAULT_LAMMPS_LAUNCHER.to_string())
}

// --- Color ---

pub fn no_color() -> bool {
    std::env::var("NO_COLOR").is_ok_and(|v| v == "1")
}

pub fn force_color() -> bool {
    std::env::var("COLOR").is_ok_and(|v| v == "1")
}

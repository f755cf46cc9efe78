// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for `nvidia-smi` (default: 10s).
pub fn gpu_probe_timeout() -> Duration {
    parse_duration_ms("GJ_GPU_PROBE_TIMEOUT_MS").unwrap_or(Duration::from_secs(10))
}

/// How often a terminating job leader is polled during the kill grace period
/// (default: 50ms).
pub fn kill_poll_interval() -> Duration {
    parse_duration_ms("GJ_KILL_POLL_MS").unwrap_or(Duration::from_millis(50))
}

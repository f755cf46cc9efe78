// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nvidia-smi` based discovery.

use super::{GpuInventory, GpuProbe, GpuProbeError};
use crate::env;
use crate::subprocess::run_with_timeout;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tokio::process::Command;

/// `index, name` as printed by `--format=csv,noheader`
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s*,\s*(.*?)\s*$").expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static VENDOR_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^NVIDIA (GeForce )?").expect("constant regex pattern is valid")
});

/// Queries `nvidia-smi --query-gpu=index,name --format=csv,noheader`.
#[derive(Clone, Debug)]
pub struct NvidiaSmiProbe {
    program: String,
}

impl Default for NvidiaSmiProbe {
    fn default() -> Self {
        Self::new("nvidia-smi")
    }
}

impl NvidiaSmiProbe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl GpuProbe for NvidiaSmiProbe {
    async fn probe(&self) -> Result<GpuInventory, GpuProbeError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["--query-gpu=index,name", "--format=csv,noheader"]);
        let output = run_with_timeout(cmd, env::gpu_probe_timeout(), &self.program)
            .await
            .map_err(GpuProbeError::CommandFailed)?;
        if !output.status.success() {
            return Err(GpuProbeError::CommandFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        parse_query_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse `index, name` lines, dropping the `NVIDIA ` / `NVIDIA GeForce `
/// vendor prefix from names. Blank lines are ignored.
pub fn parse_query_output(text: &str) -> Result<GpuInventory, GpuProbeError> {
    let mut gpus = GpuInventory::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let caps = LINE_PATTERN
            .captures(line)
            .ok_or_else(|| GpuProbeError::BadLine(line.to_string()))?;
        let id: u32 = caps[1]
            .parse()
            .map_err(|_| GpuProbeError::BadLine(line.to_string()))?;
        let name = VENDOR_PREFIX.replace(&caps[2], "").into_owned();
        gpus.insert(id, name);
    }
    Ok(gpus)
}

#[cfg(test)]
#[path = "nvidia_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{GpuInventory, GpuProbe, GpuProbeError};
use async_trait::async_trait;

/// Probe for hosts without GPUs (`GJ_GPU_PROBE=none`).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoGpuProbe;

#[async_trait]
impl GpuProbe for NoGpuProbe {
    async fn probe(&self) -> Result<GpuInventory, GpuProbeError> {
        Ok(GpuInventory::new())
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake GPU probe for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{GpuInventory, GpuProbe, GpuProbeError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct FakeGpuState {
    gpus: GpuInventory,
    error: Option<String>,
    probes: usize,
}

/// Fake GPU probe for testing
#[derive(Clone, Default)]
pub struct FakeGpuProbe {
    inner: Arc<Mutex<FakeGpuState>>,
}

impl FakeGpuProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// A probe reporting GPUs `0..count` named `GPU <id>`.
    pub fn with_gpus(count: u32) -> Self {
        let probe = Self::new();
        probe.set_gpus((0..count).map(|id| (id, format!("GPU {id}"))).collect());
        probe
    }

    pub fn set_gpus(&self, gpus: GpuInventory) {
        let mut inner = self.inner.lock();
        inner.gpus = gpus;
        inner.error = None;
    }

    pub fn set_error(&self, message: &str) {
        self.inner.lock().error = Some(message.to_string());
    }

    /// Number of times `probe` has been called.
    pub fn probes(&self) -> usize {
        self.inner.lock().probes
    }
}

#[async_trait]
impl GpuProbe for FakeGpuProbe {
    async fn probe(&self) -> Result<GpuInventory, GpuProbeError> {
        let mut inner = self.inner.lock();
        inner.probes += 1;
        match &inner.error {
            Some(message) => Err(GpuProbeError::CommandFailed(message.clone())),
            None => Ok(inner.gpus.clone()),
        }
    }
}

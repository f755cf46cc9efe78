// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GPU discovery adapters

mod none;
mod nvidia;

pub use none::NoGpuProbe;
pub use nvidia::{parse_query_output, NvidiaSmiProbe};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeGpuProbe;

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// GPU id to display name.
pub type GpuInventory = BTreeMap<u32, String>;

/// Errors from GPU discovery
#[derive(Debug, Error)]
pub enum GpuProbeError {
    #[error("{0}")]
    CommandFailed(String),
    #[error("unparseable line from nvidia-smi: {0:?}")]
    BadLine(String),
}

/// Adapter for listing the GPUs present on the host
#[async_trait]
pub trait GpuProbe: Clone + Send + Sync + 'static {
    async fn probe(&self) -> Result<GpuInventory, GpuProbeError>;
}

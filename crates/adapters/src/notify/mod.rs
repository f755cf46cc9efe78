// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification adapters

mod command;
mod noop;

pub use command::CommandNotifyAdapter;
pub use noop::NoOpNotifyAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifyAdapter, NotifyCall};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from notify operations
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to run {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Fire-and-forget delivery of one-line job notices.
#[async_trait]
pub trait NotifyAdapter: Clone + Send + Sync + 'static {
    /// Hand `message` to the notifier. Returns once delivery has started;
    /// it never waits for the notifier to finish.
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

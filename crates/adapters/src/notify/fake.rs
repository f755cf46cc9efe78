// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notification adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyCall {
    pub message: String,
}

#[derive(Default)]
struct FakeNotifyState {
    calls: Vec<NotifyCall>,
    fail: bool,
}

/// Fake notification adapter for testing
#[derive(Clone, Default)]
pub struct FakeNotifyAdapter {
    inner: Arc<Mutex<FakeNotifyState>>,
}

impl FakeNotifyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded notifications
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.inner.lock().calls.clone()
    }

    /// Recorded messages only, in order.
    pub fn messages(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .map(|c| c.message.clone())
            .collect()
    }

    /// Make every later call fail as if the notifier binary were missing.
    pub fn set_failing(&self, fail: bool) {
        self.inner.lock().fail = fail;
    }
}

#[async_trait]
impl NotifyAdapter for FakeNotifyAdapter {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let mut inner = self.inner.lock();
        inner.calls.push(NotifyCall {
            message: message.to_string(),
        });
        if inner.fail {
            return Err(NotifyError::SpawnFailed {
                program: "fake-notify".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;

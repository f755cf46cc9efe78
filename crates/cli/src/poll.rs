// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Board polling for `gj wait`: fixed interval, optional deadline, Ctrl+C.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

/// Outcome of waiting for the next poll.
#[derive(Debug, PartialEq, Eq)]
pub enum Tick {
    Ready,
    Timeout,
    Interrupted,
}

pub struct Poller {
    interval: Duration,
    deadline: Option<Instant>,
    ctrl_c: Pin<Box<dyn Future<Output = std::io::Result<()>>>>,
}

impl Poller {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self {
            interval,
            deadline: timeout.map(|t| Instant::now() + t),
            ctrl_c: Box::pin(tokio::signal::ctrl_c()),
        }
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Sleep one interval, never past the deadline.
    pub async fn tick(&mut self) -> Tick {
        if self.expired() {
            return Tick::Timeout;
        }
        let sleep = match self.deadline {
            Some(d) => self.interval.min(d.saturating_duration_since(Instant::now())),
            None => self.interval,
        };
        tokio::select! {
            _ = &mut self.ctrl_c => Tick::Interrupted,
            _ = tokio::time::sleep(sleep) => {
                if self.expired() { Tick::Timeout } else { Tick::Ready }
            }
        }
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;

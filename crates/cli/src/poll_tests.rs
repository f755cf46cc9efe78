// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::{Duration, Instant};

use super::*;

#[tokio::test]
async fn ready_before_deadline() {
    let mut poller = Poller::new(Duration::from_millis(10), Some(Duration::from_secs(5)));
    assert_eq!(poller.tick().await, Tick::Ready);
    assert_eq!(poller.tick().await, Tick::Ready);
}

#[tokio::test]
async fn timeout_when_already_expired() {
    let mut poller = Poller::new(Duration::from_millis(10), Some(Duration::ZERO));
    assert_eq!(poller.tick().await, Tick::Timeout);
}

#[tokio::test]
async fn sleep_is_cut_short_by_deadline() {
    let mut poller = Poller::new(Duration::from_secs(30), Some(Duration::from_millis(20)));
    let started = Instant::now();

    assert_eq!(poller.tick().await, Tick::Timeout);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn no_deadline_polls_indefinitely() {
    let mut poller = Poller::new(Duration::from_millis(5), None);
    for _ in 0..5 {
        assert_eq!(poller.tick().await, Tick::Ready);
    }
}

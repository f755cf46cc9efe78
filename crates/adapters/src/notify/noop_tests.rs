// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn noop_notify_returns_ok() {
    let adapter = NoOpNotifyAdapter::new();
    assert!(adapter.notify("new 0 alice /tmp").await.is_ok());
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;
use tempfile::tempdir;

#[tokio::test]
async fn passes_message_as_single_argument() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("notify.sh");
    let out = dir.path().join("received");
    std::fs::write(
        &script,
        format!("#!/bin/sh\nprintf '%s|%s' \"$#\" \"$1\" > {}\n", out.display()),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let adapter = CommandNotifyAdapter::new(script.to_string_lossy());
    adapter.notify("start 3 alice /home/alice/run").await.unwrap();

    let mut received = String::new();
    for _ in 0..100 {
        if let Ok(text) = std::fs::read_to_string(&out) {
            if !text.is_empty() {
                received = text;
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(received, "1|start 3 alice /home/alice/run");
}

#[tokio::test]
async fn missing_program_is_reported() {
    let adapter = CommandNotifyAdapter::new("/nonexistent/notify");
    let err = adapter.notify("new 0 alice /tmp").await.unwrap_err();
    assert!(err.to_string().contains("/nonexistent/notify"), "got: {err}");
}

#[tokio::test]
async fn failing_notifier_is_not_an_error() {
    let adapter = CommandNotifyAdapter::new("false");
    assert!(adapter.notify("finish 0 alice /tmp").await.is_ok());
}

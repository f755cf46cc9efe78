//! Daemon startup, single-instance lock, and shutdown

use crate::prelude::*;

#[test]
fn first_tick_publishes_an_empty_board() {
    let node = Node::new().start();
    node.gj().args(&["list"]).passes().stdout_eq("No jobs\n");
}

#[test]
fn gpus_without_probe_reports_none() {
    let node = Node::new().start();
    node.gj().args(&["gpus"]).passes().stdout_eq("No GPUs detected\n");
}

#[test]
fn second_daemon_refuses_to_start() {
    let node = Node::new().start();
    let out = node.gjd().fails();
    assert!(
        out.stderr().contains("gjd is already running"),
        "stderr: {}",
        out.stderr()
    );
}

#[test]
fn startup_marker_is_logged() {
    let node = Node::new().start();
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || node
            .daemon_log()
            .contains("--- gjd: starting (pid: ")),
        "log: {}",
        node.daemon_log()
    );
}

#[test]
fn sigterm_stops_the_daemon_and_kills_running_jobs() {
    let mut node = Node::new().start();
    node.gj()
        .args(&["submit", "custom", "--cores", "1", "--", "sleep", "30"])
        .passes();
    assert!(node.wait_status(0, "running"), "{}", node.list());

    let status = node.stop().expect("daemon was running");
    assert!(status.success(), "gjd exited with {status:?}");

    // The last board written on shutdown shows the job finished
    let out = node.gj().args(&["list", "--all"]).passes().stdout();
    assert!(out.contains("finished"), "{out}");
    assert!(!out.contains("running"), "{out}");
}

#[test]
fn daemon_can_restart_after_stop() {
    let mut node = Node::new().start();
    node.stop();
    let node = node.start();
    node.gj().args(&["list"]).passes().stdout_eq("No jobs\n");
}

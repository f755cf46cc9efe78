//! Cancelling pending and running jobs

use crate::prelude::*;

#[test]
fn cancel_pending_job() {
    let node = Node::new().start();
    node.gj()
        .args(&["submit", "custom", "--cores", "1", "--gpu", "7", "--", "true"])
        .passes();
    assert!(node.wait_status(0, "pending"), "{}", node.list());

    node.gj()
        .args(&["cancel", "0"])
        .passes()
        .stdout_eq("Cancellation requested for job 0\n");
    assert!(node.wait_status(0, "finished"), "{}", node.list());
}

#[test]
fn cancel_running_job_kills_its_process_tree() {
    let node = Node::new().start();
    node.gj()
        .args(&["submit", "custom", "--cores", "1", "--", "/bin/sh", "-c", "sleep 30 & wait"])
        .passes();
    assert!(node.wait_status(0, "running"), "{}", node.list());

    node.gj().args(&["cancel", "0"]).passes();
    node.gj()
        .args(&["wait", "0", "--timeout", "10s"])
        .passes()
        .stdout_eq("Job 0 finished\n");
}

#[test]
fn cancel_finished_job_is_reported() {
    let node = Node::new().start();
    node.gj()
        .args(&["submit", "custom", "--cores", "1", "--", "true"])
        .passes();
    node.gj().args(&["wait", "0", "--timeout", "10s"]).passes();

    node.gj()
        .args(&["cancel", "0"])
        .passes()
        .stdout_eq("Job 0 already finished\n");
}

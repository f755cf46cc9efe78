//! Resource admission against the daemon's core budget

use crate::prelude::*;

#[test]
fn job_waits_for_free_cores() {
    // gjd runs with GJ_CPU_CORES=4
    let node = Node::new().start();
    node.gj()
        .args(&["submit", "custom", "--cores", "3", "--", "sleep", "30"])
        .passes();
    assert!(node.wait_status(0, "running"), "{}", node.list());

    node.gj()
        .args(&["submit", "custom", "--cores", "2", "--", "true"])
        .passes();
    assert!(node.wait_status(1, "pending"), "{}", node.list());

    // Cancelling the big job frees its cores
    node.gj().args(&["cancel", "0"]).passes();
    assert!(node.wait_status(1, "finished"), "{}", node.list());
}

#[test]
fn run_now_skips_the_core_budget() {
    let node = Node::new().start();
    node.gj()
        .args(&["submit", "custom", "--cores", "4", "--", "sleep", "30"])
        .passes();
    assert!(node.wait_status(0, "running"), "{}", node.list());

    node.gj()
        .args(&["submit", "custom", "--cores", "2", "--run-now", "--", "sleep", "30"])
        .passes();
    assert!(node.wait_status(1, "running"), "{}", node.list());
}

#[test]
fn unknown_gpu_keeps_job_pending() {
    // No GPUs are detected with GJ_GPU_PROBE=none
    let node = Node::new().start();
    node.gj()
        .args(&["submit", "custom", "--cores", "1", "--gpu", "0", "--", "true"])
        .passes();
    assert!(node.wait_status(0, "pending"), "{}", node.list());

    node.gj()
        .args(&["gpus", "-o", "json"])
        .passes()
        .stdout_eq("[]\n");
}

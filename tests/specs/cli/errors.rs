//! Client-side validation and missing-daemon errors

use crate::prelude::*;

#[test]
fn submit_without_daemon_names_the_inbox() {
    let node = Node::new();
    node.gj()
        .args(&["submit", "custom", "--cores", "1", "--", "sleep", "1"])
        .fails()
        .stderr_has("is gjd running?");
}

#[test]
fn list_without_daemon_reports_missing_board() {
    let node = Node::new();
    node.gj()
        .args(&["list"])
        .fails()
        .stderr_has("no status board");
}

#[test]
fn custom_job_needs_cores() {
    let node = Node::new().start();
    node.gj()
        .args(&["submit", "custom", "--", "sleep", "1"])
        .fails()
        .stderr_has("--cores");
}

#[test]
fn unsupported_vasp_version_is_rejected() {
    let node = Node::new().start();
    node.gj()
        .args(&["submit", "vasp", "--version", "5.4.4", "--variant", "std", "--gpu", "0"])
        .fails()
        .stderr_has("unsupported VASP version 5.4.4");
}

#[test]
fn vasp_on_cpu_needs_mpi_threads() {
    let node = Node::new().start();
    node.gj()
        .args(&["submit", "vasp", "--version", "6.3.1", "--variant", "std", "--openmp-threads", "2"])
        .fails()
        .stderr_has("--mpi-threads is required");
}

#[test]
fn cancel_unknown_job_fails() {
    let node = Node::new().start();
    node.gj()
        .args(&["cancel", "42"])
        .fails()
        .stderr_has("Job not found: 42");
}

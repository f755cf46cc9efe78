//! Submitting, running, and waiting on jobs

use crate::prelude::*;

#[test]
fn submit_prints_a_summary() {
    let node = Node::new().start();
    node.gj()
        .args(&["submit", "custom", "--cores", "2", "--", "/bin/sleep", "1"])
        .passes()
        .stdout_eq(&format!(
            "Submitted sleep (2 cores) in {}\n",
            std::fs::canonicalize(node.work()).unwrap().display()
        ));
}

#[test]
fn job_output_lands_in_its_workdir() {
    let node = Node::new().start();
    node.gj()
        .args(&["submit", "custom", "--cores", "1", "--", "/bin/sh", "-c", "echo hello from gpujob"])
        .passes();
    node.gj()
        .args(&["wait", "0", "--timeout", "10s"])
        .passes()
        .stdout_eq("Job 0 finished\n");

    let output = std::fs::read_to_string(node.work().join("output.txt")).unwrap();
    assert!(output.contains("hello from gpujob"), "output: {output}");
}

#[test]
fn custom_job_sees_its_core_count() {
    let node = Node::new().start();
    node.gj()
        .args(&["submit", "custom", "--cores", "3", "--", "/bin/sh", "-c", "echo threads=$GPUJOB_MPI_THREADS"])
        .passes();
    node.gj().args(&["wait", "0", "--timeout", "10s"]).passes();

    let output = std::fs::read_to_string(node.work().join("output.txt")).unwrap();
    assert!(output.contains("threads=3"), "output: {output}");
}

#[test]
fn running_job_is_listed() {
    let node = Node::new().start();
    node.gj()
        .args(&["submit", "custom", "--cores", "1", "--comment", "long haul", "--", "sleep", "30"])
        .passes();
    assert!(node.wait_status(0, "running"), "{}", node.list());

    node.gj()
        .args(&["list"])
        .passes()
        .stdout_has("running")
        .stdout_has("sleep")
        .stdout_has("long haul");
}

#[test]
fn finished_jobs_are_hidden_without_all() {
    let node = Node::new().start();
    node.gj()
        .args(&["submit", "custom", "--cores", "1", "--", "true"])
        .passes();
    node.gj().args(&["wait", "0", "--timeout", "10s"]).passes();

    node.gj()
        .args(&["list"])
        .passes()
        .stdout_has("1 finished job(s) hidden");
    node.gj().args(&["list", "--all"]).passes().stdout_has("finished");
}

#[test]
fn wait_times_out_on_a_long_job() {
    let node = Node::new().start();
    node.gj()
        .args(&["submit", "custom", "--cores", "1", "--", "sleep", "30"])
        .passes();
    node.gj()
        .args(&["wait", "0", "--timeout", "1s"])
        .fails()
        .stderr_has("timed out waiting for job(s) 0");
}

#[test]
fn launch_failure_finishes_the_job() {
    let node = Node::new().start();
    node.gj()
        .args(&["submit", "custom", "--cores", "1", "--", "/nonexistent/program"])
        .passes();
    node.gj()
        .args(&["wait", "0", "--timeout", "10s"])
        .passes()
        .stdout_eq("Job 0 finished\n");
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gj_adapters::{FakeGpuProbe, FakeNotifyAdapter, FakeProcessAdapter, ProcessCall};
use gj_core::test_support::new_job;
use gj_core::{CancelRequest, FakeClock, JobStatus, NewJob};
use gj_storage::{owner, InboxRequest, InboxWriter, Layout};
use std::time::Duration;
use tempfile::TempDir;

type TestDaemon = Daemon<FakeProcessAdapter, FakeNotifyAdapter, FakeGpuProbe, FakeClock>;

struct Harness {
    _dir: TempDir,
    layout: Layout,
    daemon: TestDaemon,
    process: FakeProcessAdapter,
    notify: FakeNotifyAdapter,
    gpu: FakeGpuProbe,
    clock: FakeClock,
    me: String,
}

impl Harness {
    fn new(cores: u32, gpu: FakeGpuProbe) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::for_root(dir.path());
        config.cpu_cores = cores;
        config.layout.prepare().unwrap();
        let layout = config.layout.clone();

        let process = FakeProcessAdapter::new();
        let notify = FakeNotifyAdapter::new();
        let clock = FakeClock::new();
        let daemon = Daemon::new(
            config,
            Deps {
                process: process.clone(),
                notify: notify.clone(),
                gpu: gpu.clone(),
                clock: clock.clone(),
            },
        );
        Self {
            _dir: dir,
            layout,
            daemon,
            process,
            notify,
            gpu,
            clock,
            me: owner::user_name(owner::effective_uid()),
        }
    }

    fn submit(&self, jobs: Vec<NewJob>) {
        self.deposit(InboxRequest::submit(jobs));
    }

    fn cancel(&self, id: u64) {
        self.deposit(InboxRequest::cancel([JobId::new(id)]));
    }

    fn deposit(&self, request: InboxRequest) {
        InboxWriter::new(self.layout.clone(), Duration::from_secs(1))
            .deposit(&request)
            .unwrap();
    }

    fn status(&self, id: u64) -> Option<JobStatus> {
        self.daemon.registry().get(JobId::new(id)).map(|j| j.status)
    }

    fn published(&self) -> StatusSnapshot {
        Outbox::new(self.layout.clone(), Duration::from_secs(1))
            .read()
            .unwrap()
            .unwrap()
    }

    fn line(&self, verb: &str, id: u64) -> String {
        format!("{verb} {id} {} /tmp", self.me)
    }
}

fn ids(raw: &[u64]) -> Vec<JobId> {
    raw.iter().copied().map(JobId::new).collect()
}

#[tokio::test]
async fn first_tick_publishes_an_empty_board() {
    let mut h = Harness::new(8, FakeGpuProbe::with_gpus(2));

    let report = h.daemon.tick().await;

    assert!(report.published);
    let board = h.published();
    assert!(board.jobs.is_empty());
    assert_eq!(board.cpu_cores, 8);
    assert_eq!(board.gpus.len(), 2);
}

#[tokio::test]
async fn second_job_waits_for_cores() {
    let mut h = Harness::new(8, FakeGpuProbe::new());
    h.submit(vec![new_job(4, &[]), new_job(6, &[])]);

    let report = h.daemon.tick().await;
    assert_eq!(report.received, ids(&[0, 1]));
    assert_eq!(report.started, ids(&[0]));
    assert_eq!(h.status(1), Some(JobStatus::Pending));

    let pid = h.daemon.supervisor.pid_of(JobId::new(0)).unwrap();
    h.process.set_exited(pid, 0);
    let report = h.daemon.tick().await;
    assert_eq!(report.finished, ids(&[0]));
    assert_eq!(report.started, ids(&[1]));

    assert_eq!(
        h.notify.messages(),
        vec![
            h.line("new", 0),
            h.line("new", 1),
            h.line("start", 0),
            h.line("finish", 0),
            h.line("start", 1),
        ]
    );
}

#[tokio::test]
async fn jobs_sharing_a_gpu_run_one_at_a_time() {
    let mut h = Harness::new(8, FakeGpuProbe::with_gpus(2));
    h.submit(vec![new_job(1, &[0]), new_job(1, &[0]), new_job(1, &[1])]);

    let report = h.daemon.tick().await;
    assert_eq!(report.started, ids(&[0, 2]));
    assert_eq!(h.status(1), Some(JobStatus::Pending));

    let spawned = h.process.spawns();
    assert_eq!(spawned[0].env.get("CUDA_VISIBLE_DEVICES").unwrap(), "0");
    assert_eq!(spawned[1].env.get("CUDA_VISIBLE_DEVICES").unwrap(), "1");

    let pid = h.daemon.supervisor.pid_of(JobId::new(0)).unwrap();
    h.process.set_exited(pid, 0);
    let report = h.daemon.tick().await;
    assert_eq!(report.started, ids(&[1]));
}

#[tokio::test]
async fn job_on_unknown_gpu_stays_pending() {
    let mut h = Harness::new(8, FakeGpuProbe::with_gpus(1));
    let mut job = new_job(1, &[5]);
    job.run_now = true;
    h.submit(vec![job]);

    let report = h.daemon.tick().await;

    assert!(report.started.is_empty());
    assert_eq!(h.status(0), Some(JobStatus::Pending));
    assert!(h.process.spawns().is_empty());
}

#[tokio::test]
async fn run_now_ignores_capacity() {
    let mut h = Harness::new(4, FakeGpuProbe::new());
    let mut urgent = new_job(4, &[]);
    urgent.run_now = true;
    h.submit(vec![new_job(4, &[]), urgent]);

    let report = h.daemon.tick().await;

    assert_eq!(report.started, ids(&[0, 1]));
}

#[tokio::test]
async fn cancelling_a_pending_job_withdraws_it() {
    let mut h = Harness::new(1, FakeGpuProbe::new());
    h.submit(vec![new_job(1, &[]), new_job(1, &[])]);
    h.daemon.tick().await;

    h.cancel(1);
    let report = h.daemon.tick().await;

    assert_eq!(report.cancelled, ids(&[1]));
    assert_eq!(h.status(1), Some(JobStatus::Finished));
    assert_eq!(h.process.spawns().len(), 1);
    assert_eq!(h.notify.messages().last().unwrap(), &h.line("remove", 1));
}

#[tokio::test]
async fn cancelling_a_running_job_kills_its_tree() {
    let mut h = Harness::new(8, FakeGpuProbe::new());
    h.submit(vec![new_job(2, &[])]);
    h.daemon.tick().await;
    let pid = h.daemon.supervisor.pid_of(JobId::new(0)).unwrap();

    h.cancel(0);
    let report = h.daemon.tick().await;

    assert_eq!(report.cancelled, ids(&[0]));
    assert!(h.process.calls().contains(&ProcessCall::KillTree {
        pid,
        grace: Duration::from_secs(2),
    }));
    assert_eq!(h.status(0), Some(JobStatus::Finished));
    assert_eq!(h.notify.messages().last().unwrap(), &h.line("remove", 0));
    // Killed jobs are not reported again as natural exits.
    assert!(report.finished.is_empty());
}

#[tokio::test]
async fn cancellation_from_another_user_is_ignored() {
    let mut h = Harness::new(8, FakeGpuProbe::new());
    h.submit(vec![new_job(1, &[])]);
    h.daemon.tick().await;

    let foreign = CancelRequest::new(JobId::new(0)).stamp("mallory");
    assert!(!h.daemon.apply_cancellation(&foreign).await);

    assert_eq!(h.status(0), Some(JobStatus::Running));
    assert!(!h
        .process
        .calls()
        .iter()
        .any(|c| matches!(c, ProcessCall::KillTree { .. })));
}

#[tokio::test]
async fn cancelling_an_unknown_job_changes_nothing() {
    let mut h = Harness::new(8, FakeGpuProbe::new());
    h.daemon.tick().await;

    h.cancel(42);
    let report = h.daemon.tick().await;

    assert!(report.cancelled.is_empty());
    assert!(!report.published);
}

#[tokio::test]
async fn idle_ticks_do_not_republish() {
    let mut h = Harness::new(8, FakeGpuProbe::new());
    h.submit(vec![new_job(1, &[])]);
    assert!(h.daemon.tick().await.published);

    assert!(!h.daemon.tick().await.published);
    assert!(!h.daemon.tick().await.published);
}

#[tokio::test]
async fn owner_comes_from_the_request_file() {
    let mut h = Harness::new(8, FakeGpuProbe::new());
    h.submit(vec![new_job(1, &[])]);

    h.daemon.tick().await;

    let board = h.published();
    assert_eq!(board.jobs[0].owner, h.me);
}

#[tokio::test]
async fn launch_failure_finishes_the_job() {
    let mut h = Harness::new(8, FakeGpuProbe::new());
    h.process.fail_spawns(Some("No such file or directory"));
    h.submit(vec![new_job(1, &[]), new_job(1, &[])]);

    let report = h.daemon.tick().await;

    assert!(report.started.is_empty());
    assert_eq!(report.finished, ids(&[0, 1]));
    assert_eq!(h.status(0), Some(JobStatus::Finished));
    let messages = h.notify.messages();
    assert_eq!(
        messages[2],
        format!(
            "{} (failed to start: /bin/true: No such file or directory)",
            h.line("finish", 0)
        )
    );
    assert!(!messages.iter().any(|m| m.starts_with("start ")));
}

#[tokio::test]
async fn notifier_failure_does_not_stop_scheduling() {
    let mut h = Harness::new(8, FakeGpuProbe::new());
    h.notify.set_failing(true);
    h.submit(vec![new_job(1, &[])]);

    let report = h.daemon.tick().await;

    assert_eq!(report.started, ids(&[0]));
}

#[tokio::test]
async fn finished_jobs_are_pruned_after_retention() {
    let mut h = Harness::new(8, FakeGpuProbe::new());
    h.submit(vec![new_job(1, &[])]);
    h.daemon.tick().await;
    let pid = h.daemon.supervisor.pid_of(JobId::new(0)).unwrap();
    h.process.set_exited(pid, 0);

    let report = h.daemon.tick().await;
    assert!(report.published);
    assert_eq!(h.published().jobs[0].status, JobStatus::Finished);

    h.clock.advance(Duration::from_secs(30));
    assert!(h.daemon.tick().await.pruned.is_empty());

    h.clock.advance(Duration::from_secs(31));
    let before = h.notify.messages();
    let report = h.daemon.tick().await;
    assert_eq!(report.pruned, ids(&[0]));
    assert!(report.published);
    assert!(h.published().jobs.is_empty());
    // `remove` is reserved for cancellations; pruning is silent.
    assert_eq!(h.notify.messages(), before);
    assert!(!before.contains(&h.line("remove", 0)));
}

#[tokio::test]
async fn pruned_ids_are_not_reused() {
    let mut h = Harness::new(8, FakeGpuProbe::new());
    h.submit(vec![new_job(1, &[])]);
    h.daemon.tick().await;
    h.cancel(0);
    h.daemon.tick().await;
    h.clock.advance(Duration::from_secs(61));
    h.daemon.tick().await;

    h.submit(vec![new_job(1, &[])]);
    let report = h.daemon.tick().await;

    assert_eq!(report.received, ids(&[1]));
}

#[tokio::test]
async fn gpus_are_probed_on_first_tick_then_periodically() {
    let mut h = Harness::new(8, FakeGpuProbe::with_gpus(1));
    h.daemon.tick().await;
    h.daemon.tick().await;
    assert_eq!(h.gpu.probes(), 1);

    h.gpu.set_gpus([(0, "A100".to_string()), (1, "A100".to_string())].into());
    h.clock.advance(Duration::from_secs(61));
    let report = h.daemon.tick().await;

    assert_eq!(h.gpu.probes(), 2);
    assert!(report.published);
    assert_eq!(h.daemon.pool().gpus.len(), 2);
}

#[tokio::test]
async fn failed_gpu_probe_means_no_gpus() {
    let gpu = FakeGpuProbe::new();
    gpu.set_error("nvidia-smi: command not found");
    let mut h = Harness::new(8, gpu);
    h.submit(vec![new_job(1, &[0]), new_job(1, &[])]);

    let report = h.daemon.tick().await;

    assert_eq!(report.started, ids(&[1]));
    assert!(h.daemon.pool().gpus.is_empty());
}

#[tokio::test]
async fn shutdown_kills_running_jobs_and_publishes() {
    let mut h = Harness::new(2, FakeGpuProbe::new());
    h.submit(vec![new_job(2, &[]), new_job(2, &[])]);
    h.daemon.tick().await;

    h.daemon.shutdown().await;

    assert!(h.process.alive_pids().is_empty());
    assert_eq!(h.status(0), Some(JobStatus::Finished));
    assert_eq!(h.status(1), Some(JobStatus::Pending));
    assert_eq!(
        h.notify.messages().last().unwrap(),
        &format!("{} (daemon shutdown)", h.line("finish", 0))
    );
    let board = h.published();
    assert_eq!(board.jobs[0].status, JobStatus::Finished);
}

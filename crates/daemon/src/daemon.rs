// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduling loop.
//!
//! One `Daemon` value owns all scheduling state. Each [`Daemon::tick`] runs
//! drain, reap, GPU refresh, admission, prune, and publish in that order.

use std::time::Instant;

use gj_adapters::{GpuInventory, GpuProbe, NotifyAdapter, ProcessAdapter};
use gj_core::{
    next_admission, notice, Admission, Cancellation, Clock, JobId, ResourcePool, Transition,
};
use gj_storage::{Inbox, InboxError, LockError, Outbox, StatusSnapshot};
use tracing::{debug, info, warn};

use crate::lifecycle::Config;
use crate::registry::{CancelOutcome, Registry};
use crate::supervisor::{LaunchContext, Supervisor};

/// Adapters and clock the daemon runs against.
pub struct Deps<P, N, G, C> {
    pub process: P,
    pub notify: N,
    pub gpu: G,
    pub clock: C,
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub received: Vec<JobId>,
    pub cancelled: Vec<JobId>,
    pub started: Vec<JobId>,
    pub finished: Vec<JobId>,
    pub pruned: Vec<JobId>,
    pub published: bool,
}

pub struct Daemon<P, N, G, C> {
    config: Config,
    registry: Registry,
    supervisor: Supervisor<P>,
    notifier: N,
    gpu_probe: G,
    clock: C,
    inbox: Inbox,
    outbox: Outbox,
    pool: ResourcePool,
    gpu_names: GpuInventory,
    next_gpu_refresh: Option<Instant>,
}

impl<P, N, G, C> Daemon<P, N, G, C>
where
    P: ProcessAdapter,
    N: NotifyAdapter,
    G: GpuProbe,
    C: Clock,
{
    pub fn new(config: Config, deps: Deps<P, N, G, C>) -> Self {
        let ctx = LaunchContext {
            daemon_uid: config.daemon_uid,
            container: config.container.clone(),
        };
        // The first tick publishes even an empty board.
        let mut registry = Registry::new();
        registry.mark_dirty();
        Self {
            registry,
            supervisor: Supervisor::new(deps.process, ctx, config.kill_grace),
            notifier: deps.notify,
            gpu_probe: deps.gpu,
            clock: deps.clock,
            inbox: Inbox::new(config.layout.clone(), config.lock_timeout),
            outbox: Outbox::new(config.layout.clone(), config.lock_timeout),
            pool: ResourcePool::new(config.cpu_cores, []),
            gpu_names: GpuInventory::new(),
            next_gpu_refresh: None,
            config,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        self.absorb_inbox(&mut report).await;
        self.reap_exited(&mut report).await;
        self.refresh_gpus_if_due().await;
        self.admit_pending(&mut report).await;
        report.pruned = self
            .registry
            .prune(self.clock.epoch_ms(), self.config.finished_retention);
        report.published = self.publish_if_dirty();

        if report != TickReport::default() {
            debug!(?report, "tick");
        }
        report
    }

    async fn absorb_inbox(&mut self, report: &mut TickReport) {
        let batch = match self.inbox.drain() {
            Ok(batch) => batch,
            Err(InboxError::Lock(LockError::Timeout { .. })) => {
                debug!("inbox busy, retrying next tick");
                return;
            }
            Err(e) => {
                warn!(error = %e, "failed to drain inbox");
                return;
            }
        };

        for submission in batch.jobs {
            let id = self.registry.insert(
                &submission.owner,
                submission.job,
                self.clock.epoch_ms(),
            );
            if let Some(job) = self.registry.get(id) {
                info!(
                    job_id = %id,
                    owner = %job.owner,
                    program = %job.program,
                    cores = job.using_cores,
                    gpus = %job.gpu_list(),
                    run_now = job.run_now,
                    "job received"
                );
                let message = notice(Transition::New, job, None);
                self.send_notice(message).await;
            }
            report.received.push(id);
        }

        for cancellation in batch.cancellations {
            if self.apply_cancellation(&cancellation).await {
                report.cancelled.push(cancellation.job_id);
            }
        }
    }

    /// Returns true if the job was cancelled by this request.
    async fn apply_cancellation(&mut self, cancellation: &Cancellation) -> bool {
        let id = cancellation.job_id;
        match self.registry.cancel(cancellation, self.clock.epoch_ms()) {
            CancelOutcome::UnknownJob | CancelOutcome::AlreadyFinished => {
                debug!(job_id = %id, owner = %cancellation.owner, "nothing to cancel");
                false
            }
            CancelOutcome::NotOwner => {
                debug!(job_id = %id, requester = %cancellation.owner, "ignoring cancellation from non-owner");
                false
            }
            CancelOutcome::Withdrawn => {
                info!(job_id = %id, "pending job cancelled");
                self.notify_job(Transition::Remove, id, None).await;
                true
            }
            CancelOutcome::MustKill => {
                if let Err(e) = self.supervisor.terminate(id).await {
                    warn!(job_id = %id, error = %e, "failed to kill job process tree");
                }
                self.mark_finished(id);
                info!(job_id = %id, "running job cancelled");
                self.notify_job(Transition::Remove, id, None).await;
                true
            }
        }
    }

    async fn reap_exited(&mut self, report: &mut TickReport) {
        for (id, code) in self.supervisor.reap().await {
            self.mark_finished(id);
            info!(job_id = %id, ?code, "job finished");
            self.notify_job(Transition::Finish, id, None).await;
            report.finished.push(id);
        }
    }

    async fn refresh_gpus_if_due(&mut self) {
        let now = self.clock.now();
        if self.next_gpu_refresh.is_some_and(|due| now < due) {
            return;
        }
        self.next_gpu_refresh = Some(now + self.config.gpu_refresh);

        let inventory = match self.gpu_probe.probe().await {
            Ok(inventory) => inventory,
            Err(e) => {
                warn!(error = %e, "GPU discovery failed, assuming no GPUs");
                GpuInventory::new()
            }
        };
        if inventory != self.gpu_names {
            info!(gpus = ?inventory, "GPU inventory changed");
            self.pool.gpus = inventory.keys().copied().collect();
            self.gpu_names = inventory;
            self.registry.mark_dirty();
        }
    }

    async fn admit_pending(&mut self, report: &mut TickReport) {
        let mut cursor = None;
        while let Some((id, admission)) =
            next_admission(self.registry.jobs(), &self.pool, cursor)
        {
            cursor = Some(id);
            if let Err(e) = self.registry.start(id, self.clock.epoch_ms()) {
                warn!(job_id = %id, error = %e, "cannot start job");
                continue;
            }
            let Some(job) = self.registry.get(id).cloned() else {
                continue;
            };

            match self.supervisor.launch(&job).await {
                Ok(pid) => {
                    info!(
                        job_id = %id,
                        pid,
                        run_now = matches!(admission, Admission::RunNow),
                        "job started"
                    );
                    self.send_notice(notice(Transition::Start, &job, None)).await;
                    report.started.push(id);
                }
                Err(e) => {
                    warn!(job_id = %id, error = %e, "job failed to start");
                    self.mark_finished(id);
                    let detail = format!("failed to start: {}", e);
                    self.notify_job(Transition::Finish, id, Some(&detail)).await;
                    report.finished.push(id);
                }
            }
        }
    }

    fn publish_if_dirty(&mut self) -> bool {
        if !self.registry.is_dirty() {
            return false;
        }
        self.publish()
    }

    fn publish(&mut self) -> bool {
        let snapshot = StatusSnapshot::new(
            self.registry.jobs().values().cloned().collect(),
            self.gpu_names.clone(),
            self.pool.cpu_cores,
        );
        match self.outbox.publish(&snapshot) {
            Ok(()) => {
                self.registry.mark_published();
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to publish status, retrying next tick");
                false
            }
        }
    }

    /// Kill every running job, mark it finished, and publish a final snapshot.
    pub async fn shutdown(&mut self) {
        let running = self.registry.running_ids();
        info!(running = running.len(), "shutting down");
        for id in running {
            if let Err(e) = self.supervisor.terminate(id).await {
                warn!(job_id = %id, error = %e, "failed to kill job process tree");
            }
            self.mark_finished(id);
            self.notify_job(Transition::Finish, id, Some("daemon shutdown"))
                .await;
        }
        self.publish();
    }

    fn mark_finished(&mut self, id: JobId) {
        if let Err(e) = self.registry.finish(id, self.clock.epoch_ms()) {
            debug!(job_id = %id, error = %e, "finish ignored");
        }
    }

    async fn notify_job(&self, transition: Transition, id: JobId, detail: Option<&str>) {
        if let Some(job) = self.registry.get(id) {
            let message = notice(transition, job, detail);
            self.send_notice(message).await;
        }
    }

    async fn send_notice(&self, message: String) {
        if let Err(e) = self.notifier.notify(&message).await {
            warn!(error = %e, %message, "notification failed");
        }
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory job table owned by the scheduling loop.

use gj_core::{Cancellation, IdCounter, InvalidTransition, Job, JobId, JobStatus, NewJob};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// What a cancellation request amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    UnknownJob,
    /// Requester does not own the job; nothing changes.
    NotOwner,
    AlreadyFinished,
    /// The job was pending and is now finished.
    Withdrawn,
    /// The job is running; its process tree must be killed before it is
    /// marked finished.
    MustKill,
}

#[derive(Debug, Default)]
pub struct Registry {
    jobs: BTreeMap<JobId, Job>,
    ids: IdCounter,
    /// Finished jobs that have appeared in at least one publish.
    announced: BTreeSet<JobId>,
    dirty: bool,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> &BTreeMap<JobId, Job> {
        &self.jobs
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn running_ids(&self) -> Vec<JobId> {
        self.jobs
            .values()
            .filter(|j| j.is_running())
            .map(|j| j.id)
            .collect()
    }

    /// Register a new pending job and return its id.
    pub fn insert(&mut self, owner: &str, request: NewJob, now_ms: u64) -> JobId {
        let id = self.ids.next_id();
        self.jobs
            .insert(id, Job::from_request(id, owner, request, now_ms));
        self.dirty = true;
        id
    }

    /// Validate a cancellation against ownership and status. Pending jobs are
    /// finished immediately; running jobs are left for the caller to kill.
    pub fn cancel(&mut self, cancel: &Cancellation, now_ms: u64) -> CancelOutcome {
        let Some(job) = self.jobs.get_mut(&cancel.job_id) else {
            return CancelOutcome::UnknownJob;
        };
        if job.owner != cancel.owner {
            return CancelOutcome::NotOwner;
        }
        match job.status {
            JobStatus::Finished => CancelOutcome::AlreadyFinished,
            JobStatus::Running => CancelOutcome::MustKill,
            JobStatus::Pending => match job.finish(now_ms) {
                Ok(()) => {
                    self.dirty = true;
                    CancelOutcome::Withdrawn
                }
                Err(_) => CancelOutcome::AlreadyFinished,
            },
        }
    }

    pub fn start(&mut self, id: JobId, now_ms: u64) -> Result<(), InvalidTransition> {
        self.transition(id, |job| job.start(now_ms))
    }

    pub fn finish(&mut self, id: JobId, now_ms: u64) -> Result<(), InvalidTransition> {
        self.transition(id, |job| job.finish(now_ms))
    }

    fn transition(
        &mut self,
        id: JobId,
        apply: impl FnOnce(&mut Job) -> Result<(), InvalidTransition>,
    ) -> Result<(), InvalidTransition> {
        if let Some(job) = self.jobs.get_mut(&id) {
            apply(job)?;
            self.dirty = true;
        }
        Ok(())
    }

    /// Drop finished jobs that were published at least once and finished
    /// more than `retention` ago. Returns the removed ids.
    pub fn prune(&mut self, now_ms: u64, retention: Duration) -> Vec<JobId> {
        let retention_ms = retention.as_millis() as u64;
        let expired: Vec<JobId> = self
            .jobs
            .values()
            .filter(|j| j.is_finished() && self.announced.contains(&j.id))
            .filter(|j| {
                j.finished_at_ms
                    .is_some_and(|at| now_ms.saturating_sub(at) >= retention_ms)
            })
            .map(|j| j.id)
            .collect();
        for id in &expired {
            self.jobs.remove(id);
            self.announced.remove(id);
        }
        if !expired.is_empty() {
            self.dirty = true;
        }
        expired
    }

    /// Force the next publish even without job changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record that the current table has been published.
    pub fn mark_published(&mut self) {
        self.announced.extend(
            self.jobs
                .values()
                .filter(|j| j.is_finished())
                .map(|j| j.id),
        );
        self.dirty = false;
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

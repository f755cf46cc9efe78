// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Job, JobId, JobStatus, NewJob};
use std::collections::BTreeMap;

/// A minimal valid request running `/bin/true` on `cores` cores.
pub fn new_job(cores: u32, gpus: &[u32]) -> NewJob {
    NewJob::builder("/bin/true")
        .cores(cores)
        .gpus(gpus.iter().copied())
        .workdir("/tmp")
        .build()
}

pub fn pending_job(id: u64, owner: &str, cores: u32, gpus: &[u32]) -> Job {
    Job::from_request(JobId::new(id), owner, new_job(cores, gpus), 1_000_000)
}

pub fn running_job(id: u64, owner: &str, cores: u32, gpus: &[u32]) -> Job {
    let mut job = pending_job(id, owner, cores, gpus);
    job.status = JobStatus::Running;
    job.started_at_ms = Some(1_000_000);
    job
}

/// Index jobs by id.
pub fn job_table(jobs: impl IntoIterator<Item = Job>) -> BTreeMap<JobId, Job> {
    jobs.into_iter().map(|j| (j.id, j)).collect()
}

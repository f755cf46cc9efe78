// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource accounting and the first-fit admission rule.
//!
//! Committed resources are always recomputed from the job table; nothing
//! here caches counters across evaluations.

use crate::id::JobId;
use crate::job::Job;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Bound;

/// Capacity of the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePool {
    pub cpu_cores: u32,
    /// GPU ids currently known to exist.
    pub gpus: BTreeSet<u32>,
}

impl ResourcePool {
    pub fn new(cpu_cores: u32, gpus: impl IntoIterator<Item = u32>) -> Self {
        Self {
            cpu_cores,
            gpus: gpus.into_iter().collect(),
        }
    }
}

/// Resources held by running jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Committed {
    pub cores: u64,
    pub gpus: BTreeSet<u32>,
}

impl Committed {
    /// Sum cores and union GPUs over the `Running` jobs in `jobs`.
    pub fn tally<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> Self {
        let mut committed = Committed::default();
        for job in jobs.into_iter().filter(|j| j.is_running()) {
            committed.cores += u64::from(job.using_cores);
            committed.gpus.extend(job.using_gpus.iter().copied());
        }
        committed
    }

    pub fn free_cores(&self, pool: &ResourcePool) -> u64 {
        u64::from(pool.cpu_cores).saturating_sub(self.cores)
    }
}

/// Why a pending job cannot start yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// The job names a GPU the host does not have (or discovery failed).
    UnknownGpu(u32),
    /// A running job holds this GPU.
    GpuBusy(u32),
    InsufficientCores { requested: u32, free: u64 },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::UnknownGpu(id) => write!(f, "gpu {} not present", id),
            BlockReason::GpuBusy(id) => write!(f, "gpu {} busy", id),
            BlockReason::InsufficientCores { requested, free } => {
                write!(f, "needs {} cores, {} free", requested, free)
            }
        }
    }
}

/// Outcome of evaluating one pending job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admit,
    /// Admitted without capacity checks because `run_now` is set.
    RunNow,
    Blocked(BlockReason),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admit | Admission::RunNow)
    }
}

/// Decide whether `job` may start given what is already committed.
///
/// GPU existence is checked for every job. `run_now` skips only the
/// capacity checks.
pub fn evaluate(job: &Job, committed: &Committed, pool: &ResourcePool) -> Admission {
    if let Some(&gpu) = job.using_gpus.iter().find(|&&g| !pool.gpus.contains(&g)) {
        return Admission::Blocked(BlockReason::UnknownGpu(gpu));
    }
    if job.run_now {
        return Admission::RunNow;
    }
    if let Some(&gpu) = job.using_gpus.iter().find(|&&g| committed.gpus.contains(&g)) {
        return Admission::Blocked(BlockReason::GpuBusy(gpu));
    }
    if committed.cores + u64::from(job.using_cores) > u64::from(pool.cpu_cores) {
        return Admission::Blocked(BlockReason::InsufficientCores {
            requested: job.using_cores,
            free: committed.free_cores(pool),
        });
    }
    Admission::Admit
}

/// Find the first admissible pending job with an id greater than `after`.
///
/// Committed resources are recomputed from `jobs` on every call, so a caller
/// that starts the returned job and calls again sees the new commitment.
/// Blocked jobs are skipped rather than blocking later ones.
pub fn next_admission(
    jobs: &BTreeMap<JobId, Job>,
    pool: &ResourcePool,
    after: Option<JobId>,
) -> Option<(JobId, Admission)> {
    let committed = Committed::tally(jobs.values());
    let lower = match after {
        Some(id) => Bound::Excluded(id),
        None => Bound::Unbounded,
    };
    jobs.range((lower, Bound::Unbounded))
        .filter(|(_, job)| job.is_pending())
        .map(|(id, job)| (*id, evaluate(job, &committed, pool)))
        .find(|(_, admission)| admission.is_admitted())
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;

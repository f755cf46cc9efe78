// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job data model and lifecycle state machine.

use crate::id::JobId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Lifecycle state of a job.
///
/// Transitions are monotonic: `Pending -> Running -> Finished`, or
/// `Pending -> Finished` when a job is cancelled before it starts.
/// `Finished` covers normal exit, cancellation, and launch failure alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Finished,
}

impl JobStatus {
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Pending, JobStatus::Finished)
                | (JobStatus::Running, JobStatus::Finished)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Finished => write!(f, "finished"),
        }
    }
}

/// Rejected state transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job {id}: cannot move from {from} to {to}")]
pub struct InvalidTransition {
    pub id: JobId,
    pub from: JobStatus,
    pub to: JobStatus,
}

/// Reasons a submitted job is refused before it reaches the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRequest {
    #[error("program is empty")]
    EmptyProgram,
    #[error("using_cores must be positive")]
    ZeroCores,
    #[error("workdir must be an absolute path: {0}")]
    RelativeWorkdir(PathBuf),
}

/// A fully-resolved job submission as it travels through the inbox.
///
/// Carries no id, owner, or status: the daemon assigns the id, derives the
/// owner from the request file, and starts every job as `Pending`. Any such
/// fields present in a payload are ignored on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJob {
    pub program: String,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    pub using_cores: u32,
    #[serde(default)]
    pub using_gpus: BTreeSet<u32>,
    #[serde(default)]
    pub run_in_container: bool,
    #[serde(default)]
    pub run_now: bool,
    #[serde(default)]
    pub comment: String,
    pub workdir: PathBuf,
}

impl NewJob {
    pub fn builder(program: impl Into<String>) -> NewJobBuilder {
        NewJobBuilder::new(program)
    }

    pub fn validate(&self) -> Result<(), InvalidRequest> {
        if self.program.trim().is_empty() {
            return Err(InvalidRequest::EmptyProgram);
        }
        if self.using_cores == 0 {
            return Err(InvalidRequest::ZeroCores);
        }
        if !self.workdir.is_absolute() {
            return Err(InvalidRequest::RelativeWorkdir(self.workdir.clone()));
        }
        Ok(())
    }
}

/// Builder for [`NewJob`].
#[derive(Debug, Clone)]
pub struct NewJobBuilder {
    job: NewJob,
}

impl NewJobBuilder {
    fn new(program: impl Into<String>) -> Self {
        Self {
            job: NewJob {
                program: program.into(),
                arguments: Vec::new(),
                environment: BTreeMap::new(),
                using_cores: 1,
                using_gpus: BTreeSet::new(),
                run_in_container: false,
                run_now: false,
                comment: String::new(),
                workdir: PathBuf::from("/"),
            },
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.job.arguments.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.job.arguments.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.job.environment.insert(key.into(), value.into());
        self
    }

    pub fn cores(mut self, cores: u32) -> Self {
        self.job.using_cores = cores;
        self
    }

    pub fn gpus(mut self, gpus: impl IntoIterator<Item = u32>) -> Self {
        self.job.using_gpus = gpus.into_iter().collect();
        self
    }

    pub fn run_now(mut self, run_now: bool) -> Self {
        self.job.run_now = run_now;
        self
    }

    pub fn in_container(mut self, in_container: bool) -> Self {
        self.job.run_in_container = in_container;
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.job.comment = comment.into();
        self
    }

    pub fn workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.job.workdir = workdir.into();
        self
    }

    pub fn build(self) -> NewJob {
        self.job
    }
}

/// A job known to the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Resolved from the filesystem owner of the request file.
    pub owner: String,
    pub program: String,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    pub using_cores: u32,
    #[serde(default)]
    pub using_gpus: BTreeSet<u32>,
    #[serde(default)]
    pub run_in_container: bool,
    #[serde(default)]
    pub run_now: bool,
    pub status: JobStatus,
    #[serde(default)]
    pub comment: String,
    pub workdir: PathBuf,
    pub submitted_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
}

impl Job {
    /// Create a pending job from a request, stamping daemon-owned fields.
    pub fn from_request(id: JobId, owner: impl Into<String>, request: NewJob, now_ms: u64) -> Self {
        let NewJob {
            program,
            arguments,
            environment,
            using_cores,
            using_gpus,
            run_in_container,
            run_now,
            comment,
            workdir,
        } = request;
        Self {
            id,
            owner: owner.into(),
            program,
            arguments,
            environment,
            using_cores,
            using_gpus,
            run_in_container,
            run_now,
            status: JobStatus::Pending,
            comment,
            workdir,
            submitted_at_ms: now_ms,
            started_at_ms: None,
            finished_at_ms: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == JobStatus::Pending
    }

    pub fn is_running(&self) -> bool {
        self.status == JobStatus::Running
    }

    pub fn is_finished(&self) -> bool {
        self.status == JobStatus::Finished
    }

    pub fn start(&mut self, now_ms: u64) -> Result<(), InvalidTransition> {
        self.transition(JobStatus::Running)?;
        self.started_at_ms = Some(now_ms);
        Ok(())
    }

    pub fn finish(&mut self, now_ms: u64) -> Result<(), InvalidTransition> {
        self.transition(JobStatus::Finished)?;
        self.finished_at_ms = Some(now_ms);
        Ok(())
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// GPU ids as a `CUDA_VISIBLE_DEVICES` value, e.g. `"0,2"`.
    pub fn gpu_list(&self) -> String {
        self.using_gpus
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A cancellation as written by a client. Any `owner` claim is replaced by
/// the daemon before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub job_id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl CancelRequest {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            owner: None,
        }
    }

    /// Replace the claimed owner with the authenticated one.
    pub fn stamp(self, owner: impl Into<String>) -> Cancellation {
        Cancellation {
            job_id: self.job_id,
            owner: owner.into(),
        }
    }
}

/// A cancellation whose owner has been resolved from the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancellation {
    pub job_id: JobId,
    pub owner: String,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;

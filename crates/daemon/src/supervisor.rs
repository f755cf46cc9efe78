// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launching jobs under their owner's identity and tracking their processes.

use gj_adapters::{LaunchSpec, ProcessAdapter, ProcessError, ProcessState};
use gj_core::{Job, JobId};
use gj_storage::owner;
use std::collections::BTreeMap;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// File in the job's working directory that receives stdout and stderr.
pub const OUTPUT_FILE: &str = "output.txt";

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("unknown user {0}")]
    UnknownOwner(String),
    #[error("workdir {path}: {reason}")]
    Workdir { path: String, reason: String },
    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Identity and container settings a launch is built against.
#[derive(Debug, Clone)]
pub struct LaunchContext {
    pub daemon_uid: u32,
    pub container: String,
}

// Wrappers start as the daemon's user: absolute paths, a fixed environment,
// and the job's variables applied only after the identity switch.
pub const RUNUSER: &str = "/usr/sbin/runuser";
pub const MACHINECTL: &str = "/usr/bin/machinectl";
pub const ENV_PROGRAM: &str = "/usr/bin/env";
const WRAPPER_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// Build the argv, environment, and output redirection for `job`.
///
/// Container jobs go through `machinectl shell`, which takes the identity
/// and environment as flags. Host jobs of another user go through
/// `runuser ... -- env K=V <program>`. A daemon running as the owner
/// launches directly.
pub fn build_launch(job: &Job, owner_uid: u32, ctx: &LaunchContext) -> LaunchSpec {
    let mut env = job.environment.clone();
    if !job.using_gpus.is_empty() {
        env.insert("CUDA_VISIBLE_DEVICES".to_string(), job.gpu_list());
    }
    let foreign = owner_uid != ctx.daemon_uid;

    let (program, args, env, clear_env) = if job.run_in_container {
        let mut args = vec![
            "shell".to_string(),
            "--quiet".to_string(),
            format!("--uid={}", job.owner),
        ];
        args.extend(env.iter().map(|(k, v)| format!("--setenv={}={}", k, v)));
        args.push(ctx.container.clone());
        args.push(job.program.clone());
        args.extend(job.arguments.iter().cloned());
        (MACHINECTL.to_string(), args, wrapper_env(), true)
    } else if foreign {
        let mut args = vec![
            "-u".to_string(),
            job.owner.clone(),
            "--".to_string(),
            ENV_PROGRAM.to_string(),
            "--".to_string(),
        ];
        args.extend(env.iter().map(|(k, v)| format!("{}={}", k, v)));
        args.push(job.program.clone());
        args.extend(job.arguments.iter().cloned());
        (RUNUSER.to_string(), args, wrapper_env(), true)
    } else {
        (job.program.clone(), job.arguments.clone(), env, false)
    };

    LaunchSpec {
        program,
        args,
        env,
        clear_env,
        cwd: job.workdir.clone(),
        output: job.workdir.join(OUTPUT_FILE),
        output_owner: foreign.then_some(owner_uid),
    }
}

fn wrapper_env() -> BTreeMap<String, String> {
    BTreeMap::from([("PATH".to_string(), WRAPPER_PATH.to_string())])
}

/// The working directory must exist, and when launching for another user
/// it must belong to that user.
fn check_workdir(path: &Path, owner_uid: u32, daemon_uid: u32) -> Result<(), LaunchError> {
    let err = |reason: String| LaunchError::Workdir {
        path: path.display().to_string(),
        reason,
    };
    let meta = std::fs::metadata(path).map_err(|e| err(e.to_string()))?;
    if !meta.is_dir() {
        return Err(err("not a directory".to_string()));
    }
    if owner_uid != daemon_uid && meta.uid() != owner_uid {
        return Err(err(format!("not owned by uid {}", owner_uid)));
    }
    Ok(())
}

/// Process handles for running jobs, keyed by job id.
pub struct Supervisor<P> {
    adapter: P,
    ctx: LaunchContext,
    kill_grace: Duration,
    handles: BTreeMap<JobId, u32>,
}

impl<P: ProcessAdapter> Supervisor<P> {
    pub fn new(adapter: P, ctx: LaunchContext, kill_grace: Duration) -> Self {
        Self {
            adapter,
            ctx,
            kill_grace,
            handles: BTreeMap::new(),
        }
    }

    pub fn pid_of(&self, id: JobId) -> Option<u32> {
        self.handles.get(&id).copied()
    }

    pub fn supervised(&self) -> Vec<JobId> {
        self.handles.keys().copied().collect()
    }

    /// Start `job` and keep its handle.
    pub async fn launch(&mut self, job: &Job) -> Result<u32, LaunchError> {
        let owner_uid = owner::user_id(&job.owner)
            .ok_or_else(|| LaunchError::UnknownOwner(job.owner.clone()))?;
        check_workdir(&job.workdir, owner_uid, self.ctx.daemon_uid)?;
        let spec = build_launch(job, owner_uid, &self.ctx);
        let pid = self.adapter.spawn(&spec).await?;
        self.handles.insert(job.id, pid);
        Ok(pid)
    }

    /// Poll every handle and release the ones whose leader has exited.
    pub async fn reap(&mut self) -> Vec<(JobId, Option<i32>)> {
        let mut exited = Vec::new();
        for (&id, &pid) in &self.handles {
            match self.adapter.poll(pid).await {
                Ok(ProcessState::Running) => {}
                Ok(ProcessState::Exited { code }) => exited.push((id, code)),
                Err(ProcessError::UnknownProcess(_)) => {
                    warn!(job_id = %id, pid, "process handle vanished");
                    exited.push((id, None));
                }
                Err(e) => warn!(job_id = %id, pid, error = %e, "failed to poll job process"),
            }
        }
        for (id, _) in &exited {
            self.handles.remove(id);
        }
        exited
    }

    /// Kill the job's process tree and release its handle. A job without a
    /// handle is already gone.
    pub async fn terminate(&mut self, id: JobId) -> Result<(), ProcessError> {
        let Some(pid) = self.handles.remove(&id) else {
            return Ok(());
        };
        match self.adapter.kill_tree(pid, self.kill_grace).await {
            Ok(()) | Err(ProcessError::UnknownProcess(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;

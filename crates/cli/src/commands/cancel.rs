// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gj cancel` - request cancellation of jobs

use anyhow::Result;
use clap::Args;
use gj_core::{JobId, JobStatus};
use gj_storage::StatusSnapshot;

use crate::client::{Client, ClientError};
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct CancelArgs {
    /// Job ids
    #[arg(required = true)]
    pub ids: Vec<u64>,
}

/// Ids sorted by what the board currently says about them.
#[derive(Debug, Default, PartialEq, Eq, serde::Serialize)]
pub(crate) struct Triage {
    pub requested: Vec<JobId>,
    pub already_finished: Vec<JobId>,
    pub not_found: Vec<JobId>,
}

/// Check ids against the board. The daemon decides ownership; without a
/// board every id is passed through.
pub(crate) fn triage(ids: &[u64], board: Option<&StatusSnapshot>) -> Triage {
    let mut triage = Triage::default();
    for &raw in ids {
        let id = JobId::new(raw);
        if triage.requested.contains(&id) {
            continue;
        }
        let status = board.map(|b| b.jobs.iter().find(|j| j.id == id).map(|j| j.status));
        match status {
            None | Some(Some(JobStatus::Pending | JobStatus::Running)) => {
                triage.requested.push(id)
            }
            Some(Some(JobStatus::Finished)) => triage.already_finished.push(id),
            Some(None) => triage.not_found.push(id),
        }
    }
    triage
}

pub fn handle(args: CancelArgs, client: &Client, format: OutputFormat) -> Result<()> {
    let board = match client.board() {
        Ok(board) => Some(board),
        Err(ClientError::NoBoard(_)) => None,
        Err(e) => return Err(e.into()),
    };
    let triage = triage(&args.ids, board.as_ref());

    if !triage.requested.is_empty() {
        client.cancel(&triage.requested)?;
    }

    match format {
        OutputFormat::Text => {
            for id in &triage.requested {
                println!("Cancellation requested for job {}", id);
            }
            for id in &triage.already_finished {
                println!("Job {} already finished", id);
            }
            for id in &triage.not_found {
                eprintln!("Job not found: {}", id);
            }
        }
        OutputFormat::Json => print_json(&triage)?,
    }

    if !triage.not_found.is_empty() {
        anyhow::bail!("{} job(s) not found", triage.not_found.len());
    }
    Ok(())
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;

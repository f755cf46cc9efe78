// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gj gpus` - GPU inventory and who is using it

use std::io::Write;

use anyhow::Result;
use gj_core::{JobId, JobStatus};
use gj_storage::StatusSnapshot;
use serde::Serialize;

use crate::client::Client;
use crate::output::{print_json, OutputFormat};
use crate::table::{Cell, Column, Table};

#[derive(Debug, PartialEq, Eq, Serialize)]
pub(crate) struct GpuUsage {
    pub id: u32,
    pub name: String,
    /// Running jobs holding this GPU.
    pub running: Vec<JobId>,
    /// Pending jobs asking for it.
    pub pending: usize,
}

pub(crate) fn usage(board: &StatusSnapshot) -> Vec<GpuUsage> {
    board
        .gpus
        .iter()
        .map(|(&id, name)| {
            let wants = board.jobs.iter().filter(|j| j.using_gpus.contains(&id));
            GpuUsage {
                id,
                name: name.clone(),
                running: wants.clone().filter(|j| j.is_running()).map(|j| j.id).collect(),
                pending: wants.filter(|j| j.is_pending()).count(),
            }
        })
        .collect()
}

pub(crate) fn format_gpu_table(out: &mut impl Write, gpus: &[GpuUsage]) {
    if gpus.is_empty() {
        let _ = writeln!(out, "No GPUs detected");
        return;
    }

    let mut table = Table::new(vec![
        Column::new("GPU"),
        Column::new("NAME"),
        Column::new("STATE"),
        Column::new("JOBS"),
        Column::new("PENDING"),
    ]);
    for gpu in gpus {
        let state = if gpu.running.is_empty() {
            Cell::Note("free".to_string())
        } else {
            Cell::Status {
                status: JobStatus::Running,
                run_now: false,
            }
        };
        table.row(vec![
            Cell::Count(u64::from(gpu.id)),
            Cell::Text(gpu.name.clone()),
            state,
            Cell::Jobs(gpu.running.clone()),
            Cell::Count(gpu.pending as u64),
        ]);
    }
    table.render(out);
}

pub fn handle(client: &Client, format: OutputFormat) -> Result<()> {
    let board = client.board()?;
    let gpus = usage(&board);
    match format {
        OutputFormat::Text => format_gpu_table(&mut std::io::stdout(), &gpus),
        OutputFormat::Json => print_json(&gpus)?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "gpus_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gj list` - jobs on the status board

use std::io::Write;

use anyhow::Result;
use clap::Args;
use gj_core::{epoch_ms_now, format_span_ms, Job};

use crate::client::Client;
use crate::output::{format_time_ago, print_json, OutputFormat};
use crate::table::{Cell, Column, Table};

#[derive(Args)]
pub struct ListArgs {
    /// Include finished jobs
    #[arg(long)]
    pub all: bool,

    /// Only jobs owned by this user
    #[arg(long)]
    pub user: Option<String>,
}

/// Jobs to show, in id order.
pub(crate) fn select<'a>(jobs: &'a [Job], args: &ListArgs) -> Vec<&'a Job> {
    let mut shown: Vec<&Job> = jobs
        .iter()
        .filter(|j| args.all || !j.is_finished())
        .filter(|j| args.user.as_deref().map_or(true, |u| j.owner == u))
        .collect();
    shown.sort_by_key(|j| j.id);
    shown
}

/// How long the job has run, or "-" if it never started.
fn runtime(job: &Job, now_ms: u64) -> String {
    match job.started_at_ms {
        Some(start) => format_span_ms(start, job.finished_at_ms.unwrap_or(now_ms)),
        None => "-".to_string(),
    }
}

fn program_name(job: &Job) -> String {
    let base = job.program.rsplit('/').next().unwrap_or(&job.program);
    if job.run_in_container {
        format!("{} [container]", base)
    } else {
        base.to_string()
    }
}

pub(crate) fn format_job_list(out: &mut impl Write, jobs: &[&Job], now_ms: u64) {
    if jobs.is_empty() {
        let _ = writeln!(out, "No jobs");
        return;
    }

    let mut table = Table::new(vec![
        Column::new("ID"),
        Column::new("OWNER"),
        Column::new("STATUS"),
        Column::new("CORES"),
        Column::new("GPUS"),
        Column::new("SUBMITTED"),
        Column::new("RUNTIME"),
        Column::new("PROGRAM").with_max(32),
        Column::new("COMMENT").with_max(40),
    ]);

    for job in jobs {
        table.row(vec![
            Cell::Id(job.id),
            Cell::Text(job.owner.clone()),
            Cell::Status {
                status: job.status,
                run_now: job.run_now,
            },
            Cell::Count(u64::from(job.using_cores)),
            Cell::Gpus(job.using_gpus.iter().copied().collect()),
            Cell::Text(format_time_ago(Some(job.submitted_at_ms), now_ms)),
            Cell::Text(runtime(job, now_ms)),
            Cell::Text(program_name(job)),
            Cell::Note(job.comment.clone()),
        ]);
    }

    table.render(out);
}

pub fn handle(args: ListArgs, client: &Client, format: OutputFormat) -> Result<()> {
    let board = client.board()?;
    let jobs = select(&board.jobs, &args);

    match format {
        OutputFormat::Text => {
            let mut out = std::io::stdout();
            format_job_list(&mut out, &jobs, epoch_ms_now());
            let hidden = board
                .jobs
                .iter()
                .filter(|j| j.is_finished())
                .filter(|j| args.user.as_deref().map_or(true, |u| j.owner == u))
                .count();
            if !args.all && hidden > 0 {
                println!("\n{} finished job(s) hidden. Use --all to show them.", hidden);
            }
        }
        OutputFormat::Json => print_json(&jobs)?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;

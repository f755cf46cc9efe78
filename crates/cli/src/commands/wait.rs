// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gj wait` - block until jobs finish

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use gj_core::JobId;
use gj_storage::StatusSnapshot;

use crate::client::Client;
use crate::env;
use crate::poll::{Poller, Tick};

#[derive(Args)]
pub struct WaitArgs {
    /// Job ids
    #[arg(required = true)]
    pub ids: Vec<u64>,

    /// Give up after this long (e.g. "30s", "5m", "1h30m")
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,
}

/// Parse a human-readable duration string (e.g. "5m", "30s", "1h30m").
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let mut total_secs: u64 = 0;
    let mut digits = String::new();

    for c in s.trim().chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let n: u64 = digits
            .parse()
            .map_err(|_| format!("invalid duration: {}", s))?;
        digits.clear();
        total_secs += match c {
            'h' => n * 3600,
            'm' => n * 60,
            's' => n,
            _ => return Err(format!("unknown duration unit '{}' in: {}", c, s)),
        };
    }
    // Bare number → seconds
    if !digits.is_empty() {
        total_secs += digits
            .parse::<u64>()
            .map_err(|_| format!("invalid duration: {}", s))?;
    }
    if total_secs == 0 {
        return Err(format!("duration must be positive: {}", s));
    }
    Ok(Duration::from_secs(total_secs))
}

/// Ids from `waiting` that are finished or gone from the board. Jobs are
/// pruned some time after they finish, so absence counts as done.
pub(crate) fn settled(waiting: &BTreeSet<JobId>, board: &StatusSnapshot) -> Vec<JobId> {
    waiting
        .iter()
        .copied()
        .filter(|id| {
            board
                .jobs
                .iter()
                .find(|j| j.id == *id)
                .map_or(true, |j| j.is_finished())
        })
        .collect()
}

pub async fn handle(args: WaitArgs, client: &Client) -> Result<()> {
    let mut waiting: BTreeSet<JobId> = args.ids.into_iter().map(JobId::new).collect();
    let mut poller = Poller::new(env::wait_poll(), args.timeout);

    loop {
        let board = client.board()?;
        for id in settled(&waiting, &board) {
            println!("Job {} finished", id);
            waiting.remove(&id);
        }
        if waiting.is_empty() {
            return Ok(());
        }

        match poller.tick().await {
            Tick::Ready => {}
            Tick::Timeout => {
                let ids: Vec<String> = waiting.iter().map(|id| id.to_string()).collect();
                anyhow::bail!("timed out waiting for job(s) {}", ids.join(", "));
            }
            Tick::Interrupted => anyhow::bail!("interrupted"),
        }
    }
}

#[cfg(test)]
#[path = "wait_tests.rs"]
mod tests;

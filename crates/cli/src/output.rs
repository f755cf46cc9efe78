// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use serde::Serialize;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Format a timestamp relative to `now_ms` (e.g., "5s", "2m", "1h30m").
///
/// A missing timestamp renders as "-".
pub fn format_time_ago(epoch_ms: Option<u64>, now_ms: u64) -> String {
    match epoch_ms {
        Some(at) if at > 0 => gj_core::format_elapsed_ms(now_ms.saturating_sub(at)),
        _ => "-".to_string(),
    }
}

/// Pretty-print any serializable value as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

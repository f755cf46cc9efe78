// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock helpers and short duration formatting for job listings.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
pub fn epoch_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Format seconds as a short duration: `"5s"`, `"2m"`, `"1h30m"`, `"3d4h"`.
///
/// Only the two most significant units are shown, and the smaller one is
/// dropped when zero.
pub fn format_elapsed(secs: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    let pair = |big: u64, big_unit: &str, small: u64, small_unit: &str| {
        if small > 0 {
            format!("{}{}{}{}", big, big_unit, small, small_unit)
        } else {
            format!("{}{}", big, big_unit)
        }
    };

    if secs < MINUTE {
        format!("{}s", secs)
    } else if secs < HOUR {
        format!("{}m", secs / MINUTE)
    } else if secs < DAY {
        pair(secs / HOUR, "h", (secs % HOUR) / MINUTE, "m")
    } else {
        pair(secs / DAY, "d", (secs % DAY) / HOUR, "h")
    }
}

pub fn format_elapsed_ms(ms: u64) -> String {
    format_elapsed(ms / 1000)
}

/// Elapsed time between two epoch-ms stamps; `"0s"` if `to` precedes `from`.
pub fn format_span_ms(from_ms: u64, to_ms: u64) -> String {
    format_elapsed_ms(to_ms.saturating_sub(from_ms))
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::IsTerminal;

use gj_core::JobStatus;

pub mod codes {
    /// Section headers: steel blue
    pub const HEADER: u8 = 74;
    /// Muted / secondary text: darker grey
    pub const MUTED: u8 = 240;
}

/// Determine if color output should be enabled.
///
/// Priority: `NO_COLOR=1` disables → `COLOR=1` forces → TTY check.
pub fn should_colorize() -> bool {
    if crate::env::no_color() {
        return false;
    }
    if crate::env::force_color() {
        return true;
    }
    std::io::stdout().is_terminal()
}

fn fg256(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

const RESET: &str = "\x1b[0m";

/// Apply header color unconditionally (caller decides whether to use this).
pub(crate) fn apply_header(text: &str) -> String {
    format!("{}{}{}", fg256(codes::HEADER), text, RESET)
}

/// Apply muted color unconditionally (caller decides whether to use this).
pub(crate) fn apply_muted(text: &str) -> String {
    format!("{}{}{}", fg256(codes::MUTED), text, RESET)
}

/// Color already-padded text by job state: running green, pending yellow,
/// finished muted.
pub(crate) fn apply_status(status: JobStatus, text: &str) -> String {
    match status {
        JobStatus::Running => format!("\x1b[32m{text}{RESET}"),
        JobStatus::Pending => format!("\x1b[33m{text}{RESET}"),
        JobStatus::Finished => apply_muted(text),
    }
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;

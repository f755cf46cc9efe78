// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-line messages handed to the external notifier.

use crate::job::Job;
use std::fmt;

/// Lifecycle moments that produce a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Job entered the registry.
    New,
    Start,
    /// Job ended on its own (or failed to launch).
    Finish,
    /// Job was cancelled by its owner.
    Remove,
}

impl Transition {
    pub fn verb(self) -> &'static str {
        match self {
            Transition::New => "new",
            Transition::Start => "start",
            Transition::Finish => "finish",
            Transition::Remove => "remove",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Build the notification text for `job`, e.g. `"start 3 alice /home/alice/run"`.
///
/// `detail` is appended in parentheses when present.
pub fn notice(transition: Transition, job: &Job, detail: Option<&str>) -> String {
    let mut message = format!(
        "{} {} {} {}",
        transition,
        job.id,
        job.owner,
        job.workdir.display()
    );
    if let Some(detail) = detail {
        message.push_str(&format!(" ({})", detail));
    }
    message
}

#[cfg(test)]
#[path = "notice_tests.rs"]
mod tests;

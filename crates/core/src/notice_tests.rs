// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::id::JobId;
use crate::job::NewJob;

fn job() -> Job {
    let request = NewJob::builder("/bin/vasp")
        .workdir("/home/alice/si")
        .build();
    Job::from_request(JobId::new(12), "alice", request, 0)
}

#[yare::parameterized(
    new    = { Transition::New,    "new 12 alice /home/alice/si" },
    start  = { Transition::Start,  "start 12 alice /home/alice/si" },
    finish = { Transition::Finish, "finish 12 alice /home/alice/si" },
    remove = { Transition::Remove, "remove 12 alice /home/alice/si" },
)]
fn message_per_transition(transition: Transition, expected: &str) {
    assert_eq!(notice(transition, &job(), None), expected);
}

#[test]
fn detail_is_parenthesised() {
    let message = notice(
        Transition::Finish,
        &job(),
        Some("failed to start: No such file or directory"),
    );
    assert_eq!(
        message,
        "finish 12 alice /home/alice/si (failed to start: No such file or directory)"
    );
}

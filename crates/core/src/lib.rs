// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gj-core: data model and scheduling rules for the gpujob scheduler

pub mod admission;
pub mod clock;
pub mod id;
pub mod job;
pub mod notice;
pub mod time_fmt;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use admission::{next_admission, Admission, BlockReason, Committed, ResourcePool};
pub use clock::{Clock, FakeClock, SystemClock};
pub use id::{IdCounter, JobId};
pub use job::{
    CancelRequest, Cancellation, InvalidRequest, InvalidTransition, Job, JobStatus, NewJob,
    NewJobBuilder,
};
pub use notice::{notice, Transition};
pub use time_fmt::{epoch_ms_now, format_elapsed, format_elapsed_ms, format_span_ms};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! On-disk protocol shared by the gpujob daemon and its clients

mod inbox;
mod layout;
mod lock;
mod outbox;
pub mod owner;

pub use inbox::{DrainedBatch, Inbox, InboxError, InboxRequest, InboxWriter, Submission};
pub use layout::{Layout, DEFAULT_ROOT};
pub use lock::{FileLock, LockError};
pub use outbox::{Outbox, OutboxError, StatusSnapshot};

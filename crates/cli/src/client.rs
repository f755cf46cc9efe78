// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client side of the shared directory: deposit requests, read the board.

use std::path::PathBuf;
use std::time::Duration;

use gj_core::{JobId, NewJob};
use gj_storage::{
    InboxError, InboxRequest, InboxWriter, Layout, Outbox, OutboxError, StatusSnapshot,
};
use thiserror::Error;

use crate::env;

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no inbox at {0} (is gjd running?)")]
    NoInbox(PathBuf),

    #[error("no status board at {0} yet (is gjd running?)")]
    NoBoard(PathBuf),

    #[error(transparent)]
    Inbox(#[from] InboxError),

    #[error(transparent)]
    Outbox(#[from] OutboxError),
}

pub struct Client {
    layout: Layout,
    lock_timeout: Duration,
}

impl Client {
    pub fn new(layout: Layout, lock_timeout: Duration) -> Self {
        Self {
            layout,
            lock_timeout,
        }
    }

    pub fn from_env() -> Self {
        Self::new(Layout::new(env::root_dir()), env::lock_timeout())
    }

    /// Drop a submission into the inbox; returns the request file path.
    pub fn submit(&self, jobs: Vec<NewJob>) -> Result<PathBuf, ClientError> {
        self.deposit(&InboxRequest::submit(jobs))
    }

    pub fn cancel(&self, ids: &[JobId]) -> Result<PathBuf, ClientError> {
        self.deposit(&InboxRequest::cancel(ids.iter().copied()))
    }

    fn deposit(&self, request: &InboxRequest) -> Result<PathBuf, ClientError> {
        let inbox = self.layout.inbox_dir();
        if !inbox.is_dir() {
            return Err(ClientError::NoInbox(inbox));
        }
        Ok(InboxWriter::new(self.layout.clone(), self.lock_timeout).deposit(request)?)
    }

    /// The most recently published snapshot.
    pub fn board(&self) -> Result<StatusSnapshot, ClientError> {
        Outbox::new(self.layout.clone(), self.lock_timeout)
            .read()?
            .ok_or_else(|| ClientError::NoBoard(self.layout.outbox()))
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status board: the daemon's published view of every known job.
//!
//! Publishing writes `out.json.tmp`, syncs it, then renames it over
//! `out.json` while holding the outbox lock. Readers take the same lock, so
//! they always see one complete snapshot.

use crate::layout::Layout;
use crate::lock::{FileLock, LockError};
use chrono::{DateTime, Utc};
use gj_core::Job;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, Permissions};
use std::io::{self, BufReader, BufWriter};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutboxError {
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("outbox I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("outbox serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OutboxError {
    fn io(path: &Path, source: io::Error) -> Self {
        OutboxError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Contents of `out.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub jobs: Vec<Job>,
    /// GPU id to display name.
    #[serde(default)]
    pub gpus: BTreeMap<u32, String>,
    pub cpu_cores: u32,
    pub published_at: DateTime<Utc>,
}

impl StatusSnapshot {
    pub fn new(jobs: Vec<Job>, gpus: BTreeMap<u32, String>, cpu_cores: u32) -> Self {
        Self {
            jobs,
            gpus,
            cpu_cores,
            published_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Outbox {
    layout: Layout,
    lock_timeout: Duration,
}

impl Outbox {
    pub fn new(layout: Layout, lock_timeout: Duration) -> Self {
        Self {
            layout,
            lock_timeout,
        }
    }

    /// Atomically replace the published snapshot.
    pub fn publish(&self, snapshot: &StatusSnapshot) -> Result<(), OutboxError> {
        let tmp = self.layout.outbox_tmp();
        let dest = self.layout.outbox();

        {
            let file = File::create(&tmp).map_err(|e| OutboxError::io(&tmp, e))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, snapshot)?;
            let file = writer
                .into_inner()
                .map_err(|e| OutboxError::io(&tmp, e.into_error()))?;
            file.set_permissions(Permissions::from_mode(0o644))
                .map_err(|e| OutboxError::io(&tmp, e))?;
            file.sync_all().map_err(|e| OutboxError::io(&tmp, e))?;
        }

        let _lock = FileLock::acquire(&self.layout.outbox_lock(), self.lock_timeout)?;
        fs::rename(&tmp, &dest).map_err(|e| OutboxError::io(&dest, e))?;
        Ok(())
    }

    /// Read the current snapshot; `None` if nothing has been published yet.
    pub fn read(&self) -> Result<Option<StatusSnapshot>, OutboxError> {
        let path = self.layout.outbox();
        let _lock = FileLock::acquire(&self.layout.outbox_lock(), self.lock_timeout)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(OutboxError::io(&path, e)),
        };
        Ok(Some(serde_json::from_reader(BufReader::new(file))?))
    }
}

#[cfg(test)]
#[path = "outbox_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request mailbox: clients drop one file per request, the daemon drains.
//!
//! Clients write `.<uuid>.tmp` and, under the inbox lock, rename it to
//! `<uuid>.json`. The daemon only ever looks at non-hidden `*.json` entries,
//! so it never observes a partially written request.
//!
//! The owner of every job and cancellation is taken from the uid of the
//! opened request file. Whatever the payload claims is discarded.

use crate::layout::Layout;
use crate::lock::{FileLock, LockError};
use crate::owner;
use gj_core::{CancelRequest, Cancellation, JobId, NewJob};
use nix::fcntl::OFlag;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read};
use std::os::unix::fs::{MetadataExt, OpenOptionsExt};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Upper bound on a single request file.
const MAX_REQUEST_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum InboxError {
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("inbox I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl InboxError {
    fn io(path: &Path, source: io::Error) -> Self {
        InboxError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Contents of one request file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxRequest {
    #[serde(default)]
    pub new_jobs: Vec<NewJob>,
    #[serde(default)]
    pub cancel: Vec<CancelRequest>,
}

impl InboxRequest {
    pub fn submit(jobs: impl IntoIterator<Item = NewJob>) -> Self {
        Self {
            new_jobs: jobs.into_iter().collect(),
            cancel: Vec::new(),
        }
    }

    pub fn cancel(ids: impl IntoIterator<Item = JobId>) -> Self {
        Self {
            new_jobs: Vec::new(),
            cancel: ids.into_iter().map(CancelRequest::new).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.new_jobs.is_empty() && self.cancel.is_empty()
    }
}

/// Client side of the mailbox.
#[derive(Debug, Clone)]
pub struct InboxWriter {
    layout: Layout,
    lock_timeout: Duration,
}

impl InboxWriter {
    pub fn new(layout: Layout, lock_timeout: Duration) -> Self {
        Self {
            layout,
            lock_timeout,
        }
    }

    /// Write `request` as a new file in the inbox and return its final path.
    pub fn deposit(&self, request: &InboxRequest) -> Result<PathBuf, InboxError> {
        let dir = self.layout.inbox_dir();
        let name = Uuid::new_v4().to_string();
        let tmp = dir.join(format!(".{}.tmp", name));
        let dest = dir.join(format!("{}.json", name));

        if let Err(e) = write_synced(&tmp, request) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        let _lock = match FileLock::acquire(&self.layout.inbox_lock(), self.lock_timeout) {
            Ok(lock) => lock,
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                return Err(e.into());
            }
        };
        commit(&tmp, &dest)?;
        Ok(dest)
    }
}

/// Move a finished temp file into view; on failure the temp file is removed
/// since the daemon never looks at hidden names.
fn commit(tmp: &Path, dest: &Path) -> Result<(), InboxError> {
    fs::rename(tmp, dest).map_err(|e| {
        let _ = fs::remove_file(tmp);
        InboxError::io(dest, e)
    })
}

fn write_synced(path: &Path, request: &InboxRequest) -> Result<(), InboxError> {
    let file = File::create(path).map_err(|e| InboxError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, request)?;
    let file = writer
        .into_inner()
        .map_err(|e| InboxError::io(path, e.into_error()))?;
    file.sync_all().map_err(|e| InboxError::io(path, e))
}

/// A new job paired with the owner of the file that carried it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub owner: String,
    pub job: NewJob,
}

/// Everything taken out of the inbox in one drain, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainedBatch {
    pub jobs: Vec<Submission>,
    pub cancellations: Vec<Cancellation>,
}

impl DrainedBatch {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty() && self.cancellations.is_empty()
    }
}

/// Daemon side of the mailbox.
#[derive(Debug, Clone)]
pub struct Inbox {
    layout: Layout,
    lock_timeout: Duration,
}

struct Entry {
    modified: SystemTime,
    name: String,
    owner: String,
    request: InboxRequest,
}

#[derive(Debug, Error)]
enum Rejected {
    #[error("cannot open: {0}")]
    Open(io::Error),
    #[error("not a regular file")]
    NotRegular,
    #[error("has {0} hard links")]
    HardLinked(u64),
    #[error("larger than {} bytes", MAX_REQUEST_BYTES)]
    TooLarge,
    #[error("read failed: {0}")]
    Read(io::Error),
    #[error("malformed request: {0}")]
    Malformed(serde_json::Error),
}

impl Inbox {
    pub fn new(layout: Layout, lock_timeout: Duration) -> Self {
        Self {
            layout,
            lock_timeout,
        }
    }

    /// Take every complete request out of the inbox.
    ///
    /// Each considered file is deleted whether or not it parsed. Files are
    /// ordered by modification time, then name; jobs keep their order within
    /// a file. Jobs that fail validation are dropped with a warning.
    pub fn drain(&self) -> Result<DrainedBatch, InboxError> {
        let dir = self.layout.inbox_dir();
        let _lock = FileLock::acquire(&self.layout.inbox_lock(), self.lock_timeout)?;

        let listing = fs::read_dir(&dir)
            .map_err(|e| InboxError::io(&dir, e))?
            .map(|dirent| dirent.map(|d| d.path()));
        let mut entries = take_entries(&dir, listing);

        entries.sort_by(|a, b| {
            a.modified
                .cmp(&b.modified)
                .then_with(|| a.name.cmp(&b.name))
        });

        let mut batch = DrainedBatch::default();
        for entry in entries {
            debug!(
                file = %entry.name,
                owner = %entry.owner,
                jobs = entry.request.new_jobs.len(),
                cancel = entry.request.cancel.len(),
                "drained request",
            );
            for job in entry.request.new_jobs {
                if let Err(e) = job.validate() {
                    warn!(file = %entry.name, owner = %entry.owner, error = %e, "rejecting job");
                    continue;
                }
                batch.jobs.push(Submission {
                    owner: entry.owner.clone(),
                    job,
                });
            }
            batch.cancellations.extend(
                entry
                    .request
                    .cancel
                    .into_iter()
                    .map(|c| c.stamp(entry.owner.clone())),
            );
        }
        Ok(batch)
    }
}

/// Read and delete every visible `*.json` request in `listing`. A listing
/// error skips that one entry, so requests already taken stay in the batch.
fn take_entries(dir: &Path, listing: impl Iterator<Item = io::Result<PathBuf>>) -> Vec<Entry> {
    let mut entries = Vec::new();
    for path in listing {
        let path = match path {
            Ok(path) => path,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to list inbox entry");
                continue;
            }
        };
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if name.starts_with('.') || !name.ends_with(".json") {
            continue;
        }
        match read_entry(&path, name) {
            Ok(entry) => entries.push(entry),
            Err(reason) => warn!(path = %path.display(), %reason, "skipping inbox entry"),
        }
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to delete inbox entry");
            }
        }
    }
    entries
}

/// Open without following links and authenticate through the open handle.
fn read_entry(path: &Path, name: String) -> Result<Entry, Rejected> {
    let mut file = OpenOptions::new()
        .read(true)
        .custom_flags((OFlag::O_NOFOLLOW | OFlag::O_NONBLOCK).bits())
        .open(path)
        .map_err(Rejected::Open)?;
    let meta = file.metadata().map_err(Rejected::Read)?;
    if !meta.file_type().is_file() {
        return Err(Rejected::NotRegular);
    }
    if meta.nlink() > 1 {
        return Err(Rejected::HardLinked(meta.nlink()));
    }
    if meta.len() > MAX_REQUEST_BYTES {
        return Err(Rejected::TooLarge);
    }

    let owner = owner::user_name(meta.uid());
    let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);

    let mut text = String::new();
    (&mut file)
        .take(MAX_REQUEST_BYTES)
        .read_to_string(&mut text)
        .map_err(Rejected::Read)?;
    let request = serde_json::from_str(&text).map_err(Rejected::Malformed)?;

    Ok(Entry {
        modified,
        name,
        owner,
        request,
    })
}

#[cfg(test)]
#[path = "inbox_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Paths under the shared root directory.

use std::fs::{self, OpenOptions, Permissions};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub const DEFAULT_ROOT: &str = "/tmp/gpujob";

/// File and directory names under the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn inbox_dir(&self) -> PathBuf {
        self.root.join("in")
    }

    pub fn inbox_lock(&self) -> PathBuf {
        self.root.join("in.lock")
    }

    pub fn outbox(&self) -> PathBuf {
        self.root.join("out.json")
    }

    pub fn outbox_tmp(&self) -> PathBuf {
        self.root.join("out.json.tmp")
    }

    pub fn outbox_lock(&self) -> PathBuf {
        self.root.join("out.lock")
    }

    pub fn pid_file(&self) -> PathBuf {
        self.root.join("gjd.pid")
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join("gjd.log")
    }

    /// Create the root, the world-writable sticky inbox, and both lock files.
    ///
    /// Modes are set explicitly after creation so the process umask does not
    /// narrow them.
    pub fn prepare(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::set_permissions(&self.root, Permissions::from_mode(0o755))?;

        let inbox = self.inbox_dir();
        fs::create_dir_all(&inbox)?;
        fs::set_permissions(&inbox, Permissions::from_mode(0o1777))?;

        for lock in [self.inbox_lock(), self.outbox_lock()] {
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(&lock)?;
            fs::set_permissions(&lock, Permissions::from_mode(0o666))?;
        }
        Ok(())
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mapping between numeric uids and user names.

use nix::unistd::{Uid, User};

/// Passwd name for `uid`, or the decimal uid when there is no entry.
pub fn user_name(uid: u32) -> String {
    match User::from_uid(Uid::from_raw(uid)) {
        Ok(Some(user)) => user.name,
        _ => uid.to_string(),
    }
}

/// Uid for a user name. A purely numeric name is taken as the uid itself,
/// mirroring [`user_name`]'s fallback.
pub fn user_id(name: &str) -> Option<u32> {
    match User::from_name(name) {
        Ok(Some(user)) => Some(user.uid.as_raw()),
        _ => name.parse().ok(),
    }
}

pub fn effective_uid() -> u32 {
    nix::unistd::geteuid().as_raw()
}

#[cfg(test)]
#[path = "owner_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod cancel;
pub mod gpus;
pub mod list;
pub mod submit;
pub mod wait;

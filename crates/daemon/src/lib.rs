// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gpujob daemon library
//!
//! The scheduling loop and its supporting pieces, exposed so the `gjd`
//! binary and tests can assemble a daemon from any set of adapters.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod daemon;
pub mod env;
pub mod lifecycle;
pub mod registry;
pub mod supervisor;

pub use daemon::{Daemon, Deps, TickReport};
pub use lifecycle::{startup, Config, LifecycleError, PidLock};
pub use registry::{CancelOutcome, Registry};
pub use supervisor::{build_launch, LaunchContext, LaunchError, Supervisor, OUTPUT_FILE};

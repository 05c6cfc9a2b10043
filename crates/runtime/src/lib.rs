// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive-runtime: wires the store, supervisor, agent watcher, and
//! filesystem publisher into one value with a graceful shutdown path.

mod runtime;

pub use runtime::{Config, Runtime, RuntimeError};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive-engine: the worker supervisor and the filesystem publisher.
//!
//! The supervisor runs one dispatch loop per worker. Each loop polls the
//! shared log past the worker's cursor, advances the cursor, and runs the
//! worker's effect for matching events. Cancellation composes a per-worker
//! token under a system-wide token; `kill` and `stop` wait for in-flight
//! effects to return.
//!
//! The filesystem publisher is just another producer: it watches
//! configured roots and appends `file.*` events to the same log.

pub mod effect;
pub mod publisher;
pub mod supervisor;

pub use effect::{Effect, EffectError};
pub use publisher::{FsPublisher, PublisherError, DEFAULT_EXCLUDES};
pub use supervisor::{Supervisor, SupervisorError, Worker};

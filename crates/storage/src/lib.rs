// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive-storage: the durable event log.
//!
//! A single SQLite file holds three tables — the append-only `events` log,
//! per-worker `cursors`, and first-writer-wins `claims`. The file is the
//! coordination point: any number of processes may open it with the same
//! configuration and share the log. Writes serialize through SQLite's
//! single-writer discipline with a bounded busy wait; readers run
//! concurrently under WAL.

mod store;

pub use store::{EventFilter, EventStore, StoreError};

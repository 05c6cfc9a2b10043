// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive-core: shared types for the hive event log.
//!
//! Everything observable in a hive system is an [`Event`] appended to the
//! durable log. This crate holds the event shape, worker identifiers,
//! subscription pattern matching, and the well-known event type names the
//! runtime emits. It deliberately has no I/O: the store lives in
//! `hive-storage`, the supervisor in `hive-engine`.

pub mod event;
pub mod names;
pub mod pattern;
pub mod worker;

pub use event::Event;
pub use pattern::matches;
pub use worker::WorkerId;

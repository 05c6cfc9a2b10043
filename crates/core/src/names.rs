// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Well-known event type names emitted by the runtime.
//!
//! User events can use any dot-separated namespace; the names here are the
//! ones the core itself produces and that tooling keys on.

use crate::worker::WorkerId;

/// Synthetic registration event written by `get-or-init-cursor`.
pub const CURSOR_CREATE: &str = "cursor.create";

/// Emitted inside the claim transaction when a claim is won.
pub const CLAIM_CREATED: &str = "claim.created";

/// Runtime boot.
pub const LIFECYCLE_START: &str = "sys.lifecycle.start";
/// Graceful shutdown, pushed before the supervisor stops.
pub const LIFECYCLE_FINISH: &str = "sys.lifecycle.finish";

/// Agent definition seen for the first time.
pub const AGENT_CREATE: &str = "sys.agent.create";
/// Agent definition rewritten; worker replaced.
pub const AGENT_RELOAD: &str = "sys.agent.reload";
/// Agent definition deleted; worker killed.
pub const AGENT_REMOVE: &str = "sys.agent.remove";
/// Agent definition failed to parse; previous worker untouched.
pub const AGENT_ERROR: &str = "sys.agent.error";

/// Filesystem publisher event types, keyed by native change kind.
pub const FILE_CREATE: &str = "file.create";
pub const FILE_MODIFY: &str = "file.modify";
pub const FILE_DELETE: &str = "file.delete";
pub const FILE_RENAME: &str = "file.rename";

/// Worker id the filesystem publisher produces under.
pub const FS_WORKER: &str = "fs";

/// Worker id for runtime-internal emissions (`sys.lifecycle.*`, `sys.agent.*`).
pub const SYS_WORKER: &str = "sys";

/// `sys.worker.<id>.start` — pushed immediately before a matched effect runs.
pub fn worker_start(id: &WorkerId) -> String {
    format!("sys.worker.{id}.start")
}

/// `sys.worker.<id>.finish` — pushed after the effect returns success.
pub fn worker_finish(id: &WorkerId) -> String {
    format!("sys.worker.{id}.finish")
}

/// `sys.worker.<id>.error` — pushed after the effect returns failure.
pub fn worker_error(id: &WorkerId) -> String {
    format!("sys.worker.{id}.error")
}

#[cfg(test)]
#[path = "names_tests.rs"]
mod tests;

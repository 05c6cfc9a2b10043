// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event record appended to the log.

use crate::worker::WorkerId;
use serde::{Deserialize, Serialize};

/// A single immutable entry in the event log.
///
/// `id` and `timestamp` are assigned by the store on insert and never
/// change afterwards. The wire shape (one JSON object per line) is
/// `{id, timestamp, type, worker_id, payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Strictly increasing positive id, unique across the log.
    pub id: i64,
    /// Seconds since the Unix epoch at insert time.
    pub timestamp: i64,
    /// Dot-separated type namespace, e.g. `file.modify` or `plan.request`.
    /// Opaque to the core; consumed by subscription matching.
    #[serde(rename = "type")]
    pub kind: String,
    /// Producer of the event.
    pub worker_id: WorkerId,
    /// Opaque JSON payload. `{}` when the producer omitted one.
    #[serde(default = "empty_payload")]
    pub payload: serde_json::Value,
}

fn empty_payload() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Event {
    /// One-line description for log spans (e.g. `plan.request#42 from planner`).
    pub fn summary(&self) -> String {
        format!("{}#{} from {}", self.kind, self.id, self.worker_id)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

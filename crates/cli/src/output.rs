// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-delimited JSON shapes printed to stdout.

use anyhow::Result;
use hive_core::{Event, WorkerId};
use serde_json::json;

/// `{id, timestamp, type, worker_id, payload}` on one line.
pub fn event_line(event: &Event) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}

pub fn cursor_line(worker_id: &str, since: i64) -> String {
    json!({ "worker_id": worker_id, "since": since }).to_string()
}

/// `{claimed:true}` for the holder, `{claimed:false, claimant}` otherwise.
pub fn claim_line(claimed: bool, claimant: Option<&WorkerId>) -> String {
    match (claimed, claimant) {
        (true, _) => json!({ "claimed": true }).to_string(),
        (false, Some(holder)) => {
            json!({ "claimed": false, "claimant": holder }).to_string()
        }
        (false, None) => json!({ "claimed": false }).to_string(),
    }
}

pub fn check_claim_line(event_id: i64, claimant: Option<&WorkerId>) -> String {
    match claimant {
        Some(holder) => json!({ "event_id": event_id, "claimant": holder }).to_string(),
        None => json!({ "claimed": false }).to_string(),
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tolerant directory loading of agent definitions.

use crate::definition::AgentDefinition;
use std::path::Path;

/// Load every `.md` definition in `dir`, non-recursively.
///
/// Malformed files are logged and skipped; a missing directory is an empty
/// agent set, not a failure. Results are sorted by id for stable spawn
/// order.
pub fn load_dir(dir: &Path) -> Vec<AgentDefinition> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(dir = %dir.display(), "no agent directory");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot read agent directory");
            return Vec::new();
        }
    };

    let mut definitions = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        match AgentDefinition::load(&path) {
            Ok(def) => {
                tracing::info!(agent = %def.id, path = %path.display(), "loaded agent definition");
                definitions.push(def);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping malformed agent definition");
            }
        }
    }
    definitions.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
    definitions
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;

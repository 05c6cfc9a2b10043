// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent definition files: YAML header between `---` lines, verbatim body.

use crate::slug::slugify;
use hive_core::WorkerId;
use serde::Deserialize;
use std::path::Path;

/// Definition errors
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("missing `---` header block")]
    MissingHeader,

    #[error("invalid header: {0}")]
    Header(#[from] serde_yaml::Error),

    #[error("file name produces an empty agent id")]
    EmptyId,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// How an agent's body is executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum AgentKind {
    /// Body is a prompt handed to the configured agent command.
    #[default]
    #[serde(rename = "interactive-subprocess")]
    InteractiveSubprocess,
    /// Body is a shell template run through bash.
    #[serde(rename = "shell-template")]
    ShellTemplate,
}

/// A parsed agent definition.
///
/// The supervisor holds the sole strong reference once a worker is
/// spawned; cursors and past events in the log outlive any definition.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDefinition {
    /// Slug of the file stem; also the worker id and cursor key.
    pub id: WorkerId,
    pub kind: AgentKind,
    pub description: String,
    /// Subscription patterns; empty matches nothing.
    pub listen: Vec<String>,
    pub ignore_self: bool,
    /// Event types the agent declares it will produce. Advisory only.
    pub emits: Vec<String>,
    /// Interactive only. `None` grants just the event-push permission;
    /// a `"*"` entry lifts restrictions entirely.
    pub allowed_tools: Option<Vec<String>>,
    /// Interactive only; passed through to the subprocess.
    pub model: Option<String>,
    pub effort: Option<String>,
    /// Verbatim text after the header.
    pub body: String,
}

/// Recognized header keys. Unrecognized keys are ignored so definition
/// files can carry annotations for other tooling.
#[derive(Debug, Deserialize)]
struct Header {
    #[serde(rename = "type", default)]
    kind: AgentKind,
    #[serde(default)]
    description: String,
    #[serde(default)]
    listen: Vec<String>,
    #[serde(default = "default_true")]
    ignore_self: bool,
    #[serde(default)]
    emits: Vec<String>,
    #[serde(default)]
    allowed_tools: Option<Vec<String>>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    effort: Option<String>,
}

fn default_true() -> bool {
    true
}

impl AgentDefinition {
    /// Parse a definition from file content; the id comes from the path's
    /// file stem.
    pub fn parse(path: &Path, content: &str) -> Result<Self, DefinitionError> {
        let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
        let id = slugify(&stem);
        if id.is_empty() {
            return Err(DefinitionError::EmptyId);
        }

        let (header_text, body) = split_header(content).ok_or(DefinitionError::MissingHeader)?;
        // An empty header block means all defaults.
        let header_text = if header_text.trim().is_empty() { "{}" } else { header_text };
        let header: Header = serde_yaml::from_str(header_text)?;

        Ok(Self {
            id: WorkerId::new(id),
            kind: header.kind,
            description: header.description,
            listen: header.listen,
            ignore_self: header.ignore_self,
            emits: header.emits,
            allowed_tools: header.allowed_tools,
            model: header.model,
            effort: header.effort,
            body: body.to_string(),
        })
    }

    /// Read and parse a definition file.
    pub fn load(path: &Path) -> Result<Self, DefinitionError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(path, &content)
    }
}

/// Split `---\n<header>\n---\n<body>`; the closing delimiter must sit on
/// its own line.
fn split_header(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix("---")?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((header, body));
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects that run agent bodies as subprocesses.
//!
//! Both kinds race the child against the cancellation token. The child is
//! spawned with `kill_on_drop`, so the cancelled branch of the race reaps
//! it; the effect then reports cancelled, which the supervisor treats as
//! neither success nor failure.

use crate::definition::{AgentDefinition, AgentKind};
use async_trait::async_trait;
use hive_core::{Event, WorkerId};
use hive_engine::{Effect, EffectError, Worker};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Permission appended so interactive agents can always append to the log.
const PUSH_PERMISSION: &str = "Bash(hive events push:*)";

/// How many trailing stderr bytes to keep in failure payloads.
const STDERR_TAIL: usize = 512;

/// Shared subprocess configuration for agent effects.
#[derive(Debug, Clone)]
pub struct AgentRunnerConfig {
    /// Store file handed to children via `HIVE_DB`.
    pub db_path: PathBuf,
    /// Command for interactive agents.
    pub agent_command: String,
}

impl AgentRunnerConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self { db_path: db_path.into(), agent_command: "claude".to_string() }
    }

    pub fn with_agent_command(mut self, command: impl Into<String>) -> Self {
        self.agent_command = command.into();
        self
    }
}

/// Build a supervisor worker from a parsed definition.
pub fn worker_for(def: &AgentDefinition, config: &AgentRunnerConfig) -> Worker {
    let effect: Arc<dyn Effect> = match def.kind {
        AgentKind::ShellTemplate => Arc::new(ShellTemplateEffect {
            id: def.id.clone(),
            body: def.body.clone(),
            config: config.clone(),
        }),
        AgentKind::InteractiveSubprocess => Arc::new(InteractiveEffect {
            id: def.id.clone(),
            description: def.description.clone(),
            body: def.body.clone(),
            allowed_tools: def.allowed_tools.clone(),
            model: def.model.clone(),
            effort: def.effort.clone(),
            config: config.clone(),
        }),
    };
    Worker {
        id: def.id.clone(),
        listen: def.listen.clone(),
        ignore_self: def.ignore_self,
        hidden: false,
        effect,
    }
}

/// Runs the body through `bash` with the event in the environment.
struct ShellTemplateEffect {
    id: WorkerId,
    body: String,
    config: AgentRunnerConfig,
}

#[async_trait]
impl Effect for ShellTemplateEffect {
    async fn run(&self, event: &Event, cancel: CancellationToken) -> Result<(), EffectError> {
        let mut cmd = Command::new("bash");
        cmd.arg("-c")
            .arg(format!("set -euo pipefail\n{}", self.body))
            .env("HIVE_EVENT_ID", event.id.to_string())
            .env("HIVE_EVENT_TYPE", &event.kind)
            .env("HIVE_EVENT_WORKER", event.worker_id.as_str());
        base_env(&mut cmd, &self.id, &self.config, event)?;
        cmd.env("HIVE_EVENT_PAYLOAD", encode(&event.payload)?);
        run_to_completion(cmd, cancel).await
    }
}

/// Hands the body to the configured agent command as a prompt.
struct InteractiveEffect {
    id: WorkerId,
    description: String,
    body: String,
    allowed_tools: Option<Vec<String>>,
    model: Option<String>,
    effort: Option<String>,
    config: AgentRunnerConfig,
}

#[async_trait]
impl Effect for InteractiveEffect {
    async fn run(&self, event: &Event, cancel: CancellationToken) -> Result<(), EffectError> {
        let mut cmd = Command::new(&self.config.agent_command);
        cmd.arg("-p").arg(build_prompt(&self.description, &self.body, event)?);
        if let Some(model) = &self.model {
            cmd.arg("--model").arg(model);
        }
        if let Some(effort) = &self.effort {
            cmd.arg("--effort").arg(effort);
        }
        if let Some(tools) = tool_args(&self.allowed_tools) {
            cmd.arg("--allowedTools").arg(tools);
        }
        base_env(&mut cmd, &self.id, &self.config, event)?;
        run_to_completion(cmd, cancel).await
    }
}

/// Environment every agent child receives, so it can reach the same log.
fn base_env(
    cmd: &mut Command,
    id: &WorkerId,
    config: &AgentRunnerConfig,
    event: &Event,
) -> Result<(), EffectError> {
    cmd.env("HIVE_DB", &config.db_path)
        .env("HIVE_WORKER", id.as_str())
        .env("HIVE_EVENT", encode(event)?);
    Ok(())
}

/// The prompt is the definition text followed by the triggering event.
fn build_prompt(description: &str, body: &str, event: &Event) -> Result<String, EffectError> {
    let mut prompt = String::new();
    if !description.is_empty() {
        prompt.push_str(description);
        prompt.push_str("\n\n");
    }
    prompt.push_str(body);
    prompt.push_str("\n\n# Event\n```json\n");
    prompt.push_str(&encode_pretty(event)?);
    prompt.push_str("\n```\n");
    Ok(prompt)
}

/// `--allowedTools` value, or `None` when the definition lifts restrictions
/// with a `"*"` entry. The event-push permission is always appended to an
/// explicit list, and is the whole list when the definition names none.
fn tool_args(allowed: &Option<Vec<String>>) -> Option<String> {
    match allowed {
        Some(tools) if tools.iter().any(|t| t == "*") => None,
        Some(tools) => {
            let mut list = tools.clone();
            list.push(PUSH_PERMISSION.to_string());
            Some(list.join(","))
        }
        None => Some(PUSH_PERMISSION.to_string()),
    }
}

async fn run_to_completion(mut cmd: Command, cancel: CancellationToken) -> Result<(), EffectError> {
    cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped()).kill_on_drop(true);
    let child = cmd.spawn()?;

    tokio::select! {
        output = child.wait_with_output() => {
            let output = output?;
            if output.status.success() {
                Ok(())
            } else {
                Err(EffectError::Failed {
                    code: output.status.code().unwrap_or(-1),
                    stderr: stderr_tail(&output.stderr),
                })
            }
        }
        _ = cancel.cancelled() => Err(EffectError::Cancelled),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim_end();
    match text.char_indices().nth_back(STDERR_TAIL) {
        Some((idx, _)) => text[idx..].to_string(),
        None => text.to_string(),
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, EffectError> {
    serde_json::to_string(value).map_err(|e| EffectError::Other(e.to_string()))
}

fn encode_pretty<T: serde::Serialize>(value: &T) -> Result<String, EffectError> {
    serde_json::to_string_pretty(value).map_err(|e| EffectError::Other(e.to_string()))
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;

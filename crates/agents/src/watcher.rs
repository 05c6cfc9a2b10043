// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hot reload: watch the definition directory and replace workers.
//!
//! The watcher is the only component that mutates the set of running agent
//! workers after startup. Kill-then-spawn for a given id is serialized
//! inside the flush phase, so a reload never races itself.

use crate::definition::{AgentDefinition, DefinitionError};
use crate::runner::{worker_for, AgentRunnerConfig};
use crate::slug::slugify;
use hive_core::{names, WorkerId};
use hive_engine::Supervisor;
use hive_storage::EventStore;
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Watcher errors
#[derive(Debug, thiserror::Error)]
pub enum WatcherError {
    #[error("filesystem watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Watches one directory, non-recursively, for `.md` definition changes.
pub struct AgentWatcher {
    dir: PathBuf,
    debounce: Duration,
}

impl AgentWatcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), debounce: DEBOUNCE_WINDOW }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start watching. `known` seeds the already-running agent ids so a
    /// rewrite of a definition loaded at startup reads as a reload, not a
    /// create.
    pub fn spawn(
        self,
        supervisor: Supervisor,
        store: EventStore,
        runner: AgentRunnerConfig,
        known: Vec<WorkerId>,
        shutdown: CancellationToken,
    ) -> Result<JoinHandle<()>, WatcherError> {
        let (tx, rx) = mpsc::channel::<PathChange>(64);

        let mut watcher =
            notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
                match res {
                    Ok(event) => {
                        for change in PathChange::from_native(event) {
                            let _ = tx.blocking_send(change);
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "agent watch error"),
                }
            })?;
        watcher.watch(&self.dir, RecursiveMode::NonRecursive)?;
        tracing::info!(dir = %self.dir.display(), "watching agent definitions");

        Ok(tokio::spawn(run(self, supervisor, store, runner, known, watcher, rx, shutdown)))
    }
}

/// What happened to one definition path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeClass {
    Create,
    Modify,
    Remove,
}

struct PathChange {
    class: ChangeClass,
    path: PathBuf,
}

impl PathChange {
    fn from_native(event: NotifyEvent) -> Vec<Self> {
        let class = match event.kind {
            EventKind::Create(_) => ChangeClass::Create,
            EventKind::Modify(_) => ChangeClass::Modify,
            EventKind::Remove(_) => ChangeClass::Remove,
            _ => return Vec::new(),
        };
        event
            .paths
            .into_iter()
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("md"))
            .map(|path| Self { class, path })
            .collect()
    }
}

/// Project a burst of observed kinds onto one action.
fn project(classes: &[ChangeClass]) -> ChangeClass {
    if classes.contains(&ChangeClass::Create) {
        ChangeClass::Create
    } else if classes.iter().all(|c| *c == ChangeClass::Remove) {
        ChangeClass::Remove
    } else {
        ChangeClass::Modify
    }
}

#[allow(clippy::too_many_arguments)]
async fn run(
    config: AgentWatcher,
    supervisor: Supervisor,
    store: EventStore,
    runner: AgentRunnerConfig,
    known: Vec<WorkerId>,
    _watcher: notify::RecommendedWatcher,
    mut rx: mpsc::Receiver<PathChange>,
    shutdown: CancellationToken,
) {
    let mut seen: HashSet<WorkerId> = known.into_iter().collect();

    loop {
        let first = tokio::select! {
            _ = shutdown.cancelled() => break,
            change = rx.recv() => match change {
                Some(change) => change,
                None => {
                    tracing::warn!("agent watch handle lost, shutting down");
                    shutdown.cancel();
                    break;
                }
            },
        };

        let mut pending: HashMap<PathBuf, Vec<ChangeClass>> = HashMap::new();
        pending.entry(first.path).or_default().push(first.class);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                change = rx.recv() => match change {
                    Some(change) => pending.entry(change.path).or_default().push(change.class),
                    None => break,
                },
                _ = tokio::time::sleep(config.debounce) => break,
            }
        }

        for (path, classes) in pending.drain() {
            match project(&classes) {
                ChangeClass::Create | ChangeClass::Modify => {
                    reload(&path, &supervisor, &store, &runner, &mut seen).await;
                }
                ChangeClass::Remove => {
                    remove(&path, &supervisor, &store, &mut seen).await;
                }
            }
        }
    }
    tracing::info!("agent watcher stopped");
}

/// Re-read a definition and replace its worker.
async fn reload(
    path: &Path,
    supervisor: &Supervisor,
    store: &EventStore,
    runner: &AgentRunnerConfig,
    seen: &mut HashSet<WorkerId>,
) {
    let def = match AgentDefinition::load(path) {
        Ok(def) => def,
        Err(DefinitionError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            // Vanished between the notification and the read.
            remove(path, supervisor, store, seen).await;
            return;
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "agent definition failed to parse");
            let payload = json!({
                "agent_id": stem_id(path),
                "path": path.display().to_string(),
                "error": e.to_string(),
            });
            push_sys(store, names::AGENT_ERROR, &payload);
            return;
        }
    };

    let id = def.id.clone();
    let replaced = supervisor.kill(&id).await;
    let was_known = replaced || seen.contains(&id);
    if let Err(e) = supervisor.spawn(worker_for(&def, runner)) {
        tracing::warn!(agent = %id, error = %e, "failed to spawn reloaded agent");
        return;
    }
    seen.insert(id.clone());

    let kind = if was_known { names::AGENT_RELOAD } else { names::AGENT_CREATE };
    tracing::info!(agent = %id, replaced, "agent definition applied");
    push_sys(store, kind, &json!({ "agent_id": id }));
}

/// Kill the worker for a deleted definition.
async fn remove(
    path: &Path,
    supervisor: &Supervisor,
    store: &EventStore,
    seen: &mut HashSet<WorkerId>,
) {
    let id_str = stem_id(path);
    if id_str.is_empty() {
        return;
    }
    let id = WorkerId::new(id_str);
    let killed = supervisor.kill(&id).await;
    seen.remove(&id);
    tracing::info!(agent = %id, killed, "agent definition removed");
    push_sys(store, names::AGENT_REMOVE, &json!({ "agent_id": id }));
}

fn stem_id(path: &Path) -> String {
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    slugify(&stem)
}

fn push_sys(store: &EventStore, kind: &str, payload: &serde_json::Value) {
    let sys = WorkerId::new(names::SYS_WORKER);
    if let Err(e) = store.push(&sys, kind, payload) {
        tracing::warn!(kind, error = %e, "failed to push agent lifecycle event");
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime assembly and lifecycle.

use hive_agents::{load_dir, worker_for, AgentRunnerConfig, AgentWatcher, WatcherError};
use hive_core::{names, WorkerId};
use hive_engine::{
    FsPublisher, PublisherError, Supervisor, SupervisorError, DEFAULT_EXCLUDES,
};
use hive_storage::{EventStore, StoreError};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runtime errors
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("publisher error: {0}")]
    Publisher(#[from] PublisherError),

    #[error("agent watcher error: {0}")]
    Watcher(#[from] WatcherError),

    #[error("supervisor error: {0}")]
    Supervisor(#[from] SupervisorError),
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store file; created with an empty schema if absent.
    pub db_path: PathBuf,
    /// Directory of `.md` agent definitions.
    pub agents_dir: PathBuf,
    /// Roots for the filesystem publisher; empty disables it.
    pub watch_paths: Vec<PathBuf>,
    /// Exclude globs for the publisher.
    pub exclude: Vec<String>,
    /// Dispatch loop poll interval.
    pub poll_interval: Duration,
    /// Command interactive agents are run with.
    pub agent_command: String,
}

impl Config {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            agents_dir: PathBuf::from("agents"),
            watch_paths: Vec::new(),
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            poll_interval: Duration::from_secs(1),
            agent_command: "claude".to_string(),
        }
    }
}

/// A started system: store open, agent workers live, watchers running.
pub struct Runtime {
    store: EventStore,
    supervisor: Supervisor,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Runtime {
    /// Open the store and start everything. Store failure here is fatal.
    pub fn start(config: Config) -> Result<Self, RuntimeError> {
        let store = EventStore::open(&config.db_path)?;
        let shutdown = CancellationToken::new();
        let supervisor = Supervisor::new(store.clone(), shutdown.clone())
            .with_poll_interval(config.poll_interval);

        let sys = WorkerId::new(names::SYS_WORKER);
        store.push(&sys, names::LIFECYCLE_START, &json!({}))?;

        let runner = AgentRunnerConfig::new(&config.db_path)
            .with_agent_command(&config.agent_command);

        let definitions = load_dir(&config.agents_dir);
        let mut known = Vec::with_capacity(definitions.len());
        for def in &definitions {
            supervisor.spawn(worker_for(def, &runner))?;
            known.push(def.id.clone());
        }
        tracing::info!(agents = known.len(), "agent workers spawned");

        let mut tasks = Vec::new();
        if config.agents_dir.is_dir() {
            let task = AgentWatcher::new(&config.agents_dir).spawn(
                supervisor.clone(),
                store.clone(),
                runner,
                known,
                shutdown.clone(),
            )?;
            tasks.push(task);
        } else {
            tracing::info!(dir = %config.agents_dir.display(), "agent directory absent, hot reload disabled");
        }

        if !config.watch_paths.is_empty() {
            let task = FsPublisher::new(config.watch_paths.clone())
                .with_excludes(config.exclude.clone())
                .spawn(store.clone(), shutdown.clone())?;
            tasks.push(task);
        }

        Ok(Self { store, supervisor, shutdown, tasks })
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Fires when any component (e.g. a lost watch handle) asks the whole
    /// system to stop.
    pub fn cancelled(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Graceful shutdown: record the finish, stop every worker (waiting
    /// for in-flight effects), join the watcher tasks, release the store.
    pub async fn shutdown(self) {
        let sys = WorkerId::new(names::SYS_WORKER);
        if let Err(e) = self.store.push(&sys, names::LIFECYCLE_FINISH, &json!({})) {
            tracing::warn!(error = %e, "failed to push lifecycle finish");
        }
        self.supervisor.stop().await;
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "watcher task join failed");
            }
        }
        tracing::info!("runtime stopped");
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;

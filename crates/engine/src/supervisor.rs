// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker lifecycle and the per-worker dispatch loop.

use crate::effect::{Effect, EffectError};
use hive_core::{names, pattern, Event, WorkerId};
use hive_storage::EventStore;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Supervisor errors
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("worker {0} is already running")]
    AlreadyRunning(WorkerId),
}

/// A durable subscriber: id, subscription, and the effect to run per match.
pub struct Worker {
    /// Unique per supervisor; also the cursor key in the store.
    pub id: WorkerId,
    /// Subscription patterns; empty matches nothing.
    pub listen: Vec<String>,
    /// Suppress events this worker produced itself.
    pub ignore_self: bool,
    /// Hidden workers emit no `sys.worker.*` lifecycle events. Used for
    /// internal sinks.
    pub hidden: bool,
    pub effect: Arc<dyn Effect>,
}

impl Worker {
    /// A visible worker with self-suppression on, matching the common case.
    pub fn new(id: impl Into<WorkerId>, listen: Vec<String>, effect: Arc<dyn Effect>) -> Self {
        Self { id: id.into(), listen, ignore_self: true, hidden: false, effect }
    }
}

struct WorkerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the table of live workers and their dispatch loops.
///
/// The table is bound to this value — there is no process-global registry.
/// Clones share the same table and tokens.
#[derive(Clone)]
pub struct Supervisor {
    store: EventStore,
    workers: Arc<Mutex<HashMap<WorkerId, WorkerHandle>>>,
    shutdown: CancellationToken,
    poll_interval: Duration,
}

impl Supervisor {
    /// Per-worker cancellation tokens are children of `shutdown`, so
    /// cancelling it reaches every loop and in-flight effect.
    pub fn new(store: EventStore, shutdown: CancellationToken) -> Self {
        Self {
            store,
            workers: Arc::new(Mutex::new(HashMap::new())),
            shutdown,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Register the worker and start its dispatch loop.
    pub fn spawn(&self, worker: Worker) -> Result<(), SupervisorError> {
        let mut workers = self.workers.lock();
        if workers.contains_key(&worker.id) {
            return Err(SupervisorError::AlreadyRunning(worker.id));
        }
        let id = worker.id.clone();
        let cancel = self.shutdown.child_token();
        let task = tokio::spawn(dispatch_loop(
            self.store.clone(),
            worker,
            cancel.clone(),
            self.poll_interval,
        ));
        workers.insert(id, WorkerHandle { cancel, task });
        Ok(())
    }

    /// Cancel the worker, wait for its loop (and any in-flight effect) to
    /// return, and remove it. Returns whether a live worker was found.
    pub async fn kill(&self, id: &WorkerId) -> bool {
        let handle = self.workers.lock().remove(id);
        let Some(handle) = handle else {
            return false;
        };
        handle.cancel.cancel();
        if let Err(e) = handle.task.await {
            tracing::warn!(worker = %id, error = %e, "worker task join failed");
        }
        true
    }

    /// Cancel every worker via the system token and wait for all loops and
    /// in-flight effects. Idempotent.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        let drained: Vec<(WorkerId, WorkerHandle)> = self.workers.lock().drain().collect();
        for (id, handle) in drained {
            if let Err(e) = handle.task.await {
                tracing::warn!(worker = %id, error = %e, "worker task join failed");
            }
        }
    }

    /// Whether a worker with this id is currently live.
    pub fn is_live(&self, id: &WorkerId) -> bool {
        self.workers.lock().contains_key(id)
    }

    /// Ids of all live workers.
    pub fn live_ids(&self) -> Vec<WorkerId> {
        self.workers.lock().keys().cloned().collect()
    }
}

/// One tick: fetch past the cursor, advance it, filter, run the effect.
///
/// The cursor commits **before** the effect runs. Effects are subprocesses
/// with externally visible side effects, so a crash mid-effect must not
/// re-deliver: at-most-once per worker.
async fn dispatch_loop(
    store: EventStore,
    worker: Worker,
    cancel: CancellationToken,
    poll_interval: Duration,
) {
    let id = worker.id.clone();
    tracing::info!(worker = %id, listen = ?worker.listen, "worker started");

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let since = match store.get_or_init_cursor(&id) {
            Ok(since) => since,
            Err(e) => {
                tracing::warn!(worker = %id, error = %e, "cursor read failed");
                if sleep_or_cancelled(poll_interval, &cancel).await {
                    break;
                }
                continue;
            }
        };

        let event = match store.next_after(since) {
            Ok(Some(event)) => event,
            Ok(None) => {
                if sleep_or_cancelled(poll_interval, &cancel).await {
                    break;
                }
                continue;
            }
            Err(e) => {
                tracing::warn!(worker = %id, error = %e, "event fetch failed");
                if sleep_or_cancelled(poll_interval, &cancel).await {
                    break;
                }
                continue;
            }
        };

        if let Err(e) = store.set_cursor(&id, event.id) {
            // Retry the same event next tick; the effect has not run yet.
            tracing::warn!(worker = %id, event_id = event.id, error = %e, "cursor advance failed");
            if sleep_or_cancelled(poll_interval, &cancel).await {
                break;
            }
            continue;
        }

        if worker.ignore_self && event.worker_id == id {
            tokio::task::yield_now().await;
            continue;
        }

        if !pattern::matches(&event.kind, &worker.listen) {
            tokio::task::yield_now().await;
            continue;
        }

        run_effect(&store, &worker, &event, &cancel).await;

        // Keep empty-queue hot loops from starving peers.
        tokio::task::yield_now().await;
    }

    tracing::info!(worker = %id, "worker stopped");
}

async fn run_effect(store: &EventStore, worker: &Worker, event: &Event, cancel: &CancellationToken) {
    let id = &worker.id;

    if !worker.hidden {
        let payload = json!({
            "event_id": event.id,
            "event_type": event.kind,
            "worker_listen": worker.listen,
        });
        if let Err(e) = store.push(id, &names::worker_start(id), &payload) {
            tracing::warn!(worker = %id, error = %e, "failed to push start event");
        }
    }

    tracing::debug!(worker = %id, event = %event.summary(), "running effect");
    match worker.effect.run(event, cancel.clone()).await {
        Ok(()) => {
            if !worker.hidden {
                let payload = json!({ "event_id": event.id });
                if let Err(e) = store.push(id, &names::worker_finish(id), &payload) {
                    tracing::warn!(worker = %id, error = %e, "failed to push finish event");
                }
            }
        }
        Err(EffectError::Cancelled) => {
            // Cooperative cancellation is not a failure; the loop exits on
            // its next tick.
            tracing::debug!(worker = %id, event_id = event.id, "effect cancelled");
        }
        Err(e) => {
            tracing::warn!(worker = %id, event_id = event.id, error = %e, "effect failed");
            if !worker.hidden {
                let payload = json!({ "event_id": event.id, "error": e.to_string() });
                if let Err(e) = store.push(id, &names::worker_error(id), &payload) {
                    tracing::warn!(worker = %id, error = %e, "failed to push error event");
                }
            }
        }
    }
}

/// Sleep honoring cancellation; returns true when cancelled.
async fn sleep_or_cancelled(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;

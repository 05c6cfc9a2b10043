// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem publisher: native change notifications become `file.*` events.

use globset::{Glob, GlobSet, GlobSetBuilder};
use hive_core::{names, WorkerId};
use hive_storage::EventStore;
use notify::event::ModifyKind;
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Dropped changes the log must never echo: VCS noise, build output, and
/// the store file itself (a watched store would feed back into the log).
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git/**",
    "**/events.db*",
    "**/*.db-journal",
    "**/*.db-wal",
    "**/*.db-shm",
    "target/**",
    "node_modules/**",
];

const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// Publisher errors
#[derive(Debug, thiserror::Error)]
pub enum PublisherError {
    #[error("filesystem watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("bad exclude pattern: {0}")]
    Pattern(#[from] globset::Error),
}

/// Watches directories recursively and republishes coalesced changes under
/// worker id `fs`.
pub struct FsPublisher {
    roots: Vec<PathBuf>,
    exclude: Vec<String>,
    debounce: Duration,
}

impl FsPublisher {
    /// Watch `roots` with the default exclude set.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            debounce: DEBOUNCE_WINDOW,
        }
    }

    /// Replace the exclude set entirely.
    pub fn with_excludes(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start watching. The returned task runs until `shutdown` fires; loss
    /// of the native watch handle cancels `shutdown` itself so the rest of
    /// the runtime winds down with it.
    pub fn spawn(
        self,
        store: EventStore,
        shutdown: CancellationToken,
    ) -> Result<JoinHandle<()>, PublisherError> {
        let excludes = build_globset(&self.exclude)?;
        let (tx, rx) = mpsc::channel::<Change>(256);

        let mut watcher =
            notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
                match res {
                    Ok(event) => {
                        if let Some(change) = Change::from_native(event) {
                            let _ = tx.blocking_send(change);
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "fs watch error"),
                }
            })?;
        for root in &self.roots {
            watcher.watch(root, RecursiveMode::Recursive)?;
            tracing::info!(root = %root.display(), "watching");
        }

        Ok(tokio::spawn(run(store, self, excludes, watcher, rx, shutdown)))
    }
}

/// One native notification, reduced to the kinds the log distinguishes.
struct Change {
    kind: ChangeKind,
    paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeKind {
    Create,
    Modify,
    Remove,
    Rename,
}

impl Change {
    fn from_native(event: NotifyEvent) -> Option<Self> {
        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Create,
            EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Rename,
            EventKind::Modify(_) => ChangeKind::Modify,
            EventKind::Remove(_) => ChangeKind::Remove,
            _ => return None,
        };
        Some(Self { kind, paths: event.paths })
    }
}

impl ChangeKind {
    fn event_type(self) -> &'static str {
        match self {
            ChangeKind::Create => names::FILE_CREATE,
            ChangeKind::Modify => names::FILE_MODIFY,
            ChangeKind::Remove => names::FILE_DELETE,
            ChangeKind::Rename => names::FILE_RENAME,
        }
    }
}

// The watcher moves in here so the native handle lives as long as the task.
async fn run(
    store: EventStore,
    config: FsPublisher,
    excludes: GlobSet,
    _watcher: notify::RecommendedWatcher,
    mut rx: mpsc::Receiver<Change>,
    shutdown: CancellationToken,
) {
    loop {
        let first = tokio::select! {
            _ = shutdown.cancelled() => break,
            change = rx.recv() => match change {
                Some(change) => change,
                None => {
                    tracing::warn!("native watch handle lost, shutting down");
                    shutdown.cancel();
                    break;
                }
            },
        };

        // A burst ends when no new change arrives within the window. The
        // emitted type follows the last native kind observed.
        let mut kind = first.kind;
        let mut paths = first.paths;
        let mut lost = false;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                change = rx.recv() => match change {
                    Some(change) => {
                        kind = change.kind;
                        paths.extend(change.paths);
                    }
                    None => {
                        lost = true;
                        break;
                    }
                },
                _ = tokio::time::sleep(config.debounce) => break,
            }
        }

        flush(&store, &config.roots, &excludes, kind, &paths);

        if lost {
            tracing::warn!("native watch handle lost, shutting down");
            shutdown.cancel();
            break;
        }
    }
    tracing::info!("fs publisher stopped");
}

fn flush(store: &EventStore, roots: &[PathBuf], excludes: &GlobSet, kind: ChangeKind, paths: &[PathBuf]) {
    let mut relative: Vec<String> = Vec::new();
    for path in paths {
        let rel = relativize(roots, path);
        if excludes.is_match(&rel) {
            continue;
        }
        let rel = rel.to_string_lossy().into_owned();
        if !relative.contains(&rel) {
            relative.push(rel);
        }
    }
    if relative.is_empty() {
        return;
    }

    let fs = WorkerId::new(names::FS_WORKER);
    let payload = json!({ "paths": relative });
    if let Err(e) = store.push(&fs, kind.event_type(), &payload) {
        tracing::warn!(error = %e, "failed to push file event");
    }
}

/// Path relative to the first watch root containing it; matcher input and
/// payload entries both use this form.
fn relativize(roots: &[PathBuf], path: &Path) -> PathBuf {
    for root in roots {
        if let Ok(rel) = path.strip_prefix(root) {
            return rel.to_path_buf();
        }
    }
    path.to_path_buf()
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    builder.build()
}

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;

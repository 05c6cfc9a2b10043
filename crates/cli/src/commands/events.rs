// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hive events` — the log's command-line surface.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use hive_core::WorkerId;
use hive_storage::{EventFilter, EventStore};
use serde_json::json;
use std::path::Path;
use std::time::Duration;

use crate::output;

#[derive(Args)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommand,
}

#[derive(Subcommand)]
pub enum EventsCommand {
    /// Append one event and print it
    Push {
        /// Producer worker id
        #[arg(long)]
        worker: String,
        /// Dot-separated event type
        #[arg(long = "type")]
        kind: String,
        /// JSON payload; `{}` when omitted
        #[arg(long)]
        payload: Option<String>,
    },
    /// Print matching events, one JSON line each
    List {
        /// Only events with id greater than this
        #[arg(long, default_value_t = 0)]
        since: i64,
        #[arg(long)]
        limit: Option<usize>,
        /// Last N matches, still in ascending order (overrides --limit)
        #[arg(long)]
        tail: Option<usize>,
        /// Only this producer
        #[arg(long)]
        worker: Option<String>,
        /// Drop this producer
        #[arg(long)]
        omit_worker: Option<String>,
        /// Only this event type; `*` means all
        #[arg(long = "type")]
        kind: Option<String>,
    },
    /// Stream events, advancing the worker's cursor; runs until interrupted
    Watch {
        #[arg(long)]
        worker: String,
        /// Poll interval in seconds
        #[arg(long, default_value_t = 1.0)]
        poll: f64,
        /// Advance past this producer's events without printing them
        #[arg(long)]
        omit_worker: Option<String>,
    },
    /// Report the worker's cursor
    Cursor {
        #[arg(long)]
        worker: String,
    },
    /// Overwrite the worker's cursor
    SetCursor {
        #[arg(long)]
        worker: String,
        #[arg(long)]
        set: i64,
    },
    /// Claim an event id; first writer wins
    Claim {
        #[arg(long)]
        worker: String,
        #[arg(long)]
        event: i64,
    },
    /// Report who holds the claim on an event id
    CheckClaim {
        #[arg(long)]
        event: i64,
    },
}

pub async fn handle(args: EventsArgs, db: &Path) -> Result<()> {
    let store = EventStore::open(db)
        .with_context(|| format!("cannot open store at {}", db.display()))?;

    match args.command {
        EventsCommand::Push { worker, kind, payload } => {
            let payload = match payload {
                Some(text) => serde_json::from_str(&text).context("invalid --payload JSON")?,
                None => json!({}),
            };
            let event = store.push(&WorkerId::new(worker), &kind, &payload)?;
            println!("{}", output::event_line(&event)?);
        }

        EventsCommand::List { since, limit, tail, worker, omit_worker, kind } => {
            let filter = EventFilter {
                omit_worker: omit_worker.map(WorkerId::new),
                only_worker: worker.map(WorkerId::new),
                only_kind: kind.filter(|k| k.as_str() != "*"),
                tail,
            };
            for event in store.range_after(since, limit, &filter)? {
                println!("{}", output::event_line(&event)?);
            }
        }

        EventsCommand::Watch { worker, poll, omit_worker } => {
            watch(store, worker, poll, omit_worker.map(WorkerId::new)).await?;
        }

        EventsCommand::Cursor { worker } => {
            let since = store.cursor(&WorkerId::new(worker.clone()))?;
            println!("{}", output::cursor_line(&worker, since));
        }

        EventsCommand::SetCursor { worker, set } => {
            store.set_cursor(&WorkerId::new(worker.clone()), set)?;
            println!("{}", output::cursor_line(&worker, set));
        }

        EventsCommand::Claim { worker, event } => {
            let id = WorkerId::new(worker);
            if store.claim(&id, event)? {
                println!("{}", output::claim_line(true, None));
            } else {
                let claimant = store.claimant(event)?;
                println!("{}", output::claim_line(false, claimant.as_ref()));
            }
        }

        EventsCommand::CheckClaim { event } => {
            let claimant = store.claimant(event)?;
            println!("{}", output::check_claim_line(event, claimant.as_ref()));
        }
    }
    Ok(())
}

/// Poll past the cursor, printing what survives the omit filter. The
/// cursor advances past omitted events too, or the stream would never
/// move beyond them.
async fn watch(
    store: EventStore,
    worker: String,
    poll: f64,
    omit_worker: Option<WorkerId>,
) -> Result<()> {
    let id = WorkerId::new(worker);
    let interval = Duration::from_secs_f64(poll.max(0.05));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let since = store.get_or_init_cursor(&id)?;
        let batch = store.range_after(since, Some(100), &EventFilter::default())?;
        for event in &batch {
            let omitted = omit_worker.as_ref().is_some_and(|w| &event.worker_id == w);
            if !omitted {
                println!("{}", output::event_line(event)?);
            }
            store.set_cursor(&id, event.id)?;
        }

        if batch.is_empty() {
            tokio::select! {
                _ = &mut ctrl_c => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }
    Ok(())
}

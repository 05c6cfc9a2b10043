// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed event store: append, scan, cursors, claims.

use hive_core::{names, Event, WorkerId};
use parking_lot::Mutex;
use rusqlite::types::ToSqlOutput;
use rusqlite::{params, Connection, OptionalExtension, ToSql, TransactionBehavior};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

// Contending writers block for up to the busy timeout before erroring.
const PRAGMAS: &str = "
PRAGMA journal_mode=WAL;
PRAGMA synchronous=NORMAL;
PRAGMA busy_timeout=5000;
";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS events (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp INTEGER NOT NULL DEFAULT (unixepoch()),
    type      TEXT    NOT NULL,
    worker_id TEXT    NOT NULL,
    payload   TEXT    NOT NULL DEFAULT '{}'
);
CREATE TABLE IF NOT EXISTS cursors (
    worker_id TEXT PRIMARY KEY,
    since     INTEGER NOT NULL DEFAULT 0,
    timestamp INTEGER
);
CREATE TABLE IF NOT EXISTS claims (
    event_id   INTEGER PRIMARY KEY,
    worker_id  TEXT NOT NULL,
    claimed_at INTEGER NOT NULL DEFAULT (unixepoch())
);
";

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("payload encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Optional narrowing for [`EventStore::range_after`].
///
/// `tail` returns the last N surviving matches in ascending id order and
/// takes precedence over any `limit` the caller passes.
#[derive(Debug, Default, Clone)]
pub struct EventFilter {
    pub omit_worker: Option<WorkerId>,
    pub only_worker: Option<WorkerId>,
    pub only_kind: Option<String>,
    pub tail: Option<usize>,
}

/// Handle to the shared event log.
///
/// Cheap to clone; all clones share one connection serialized by a mutex.
/// Other processes coordinate through the file itself: SQLite's
/// single-writer discipline plus the busy timeout arbitrate cross-process
/// writes.
#[derive(Clone)]
pub struct EventStore {
    conn: Arc<Mutex<Connection>>,
}

impl EventStore {
    /// Open (creating if absent) the store file and ensure the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    /// Private in-memory store, used by tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(PRAGMAS)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Append one event. The store assigns `id` and `timestamp`.
    pub fn push(
        &self,
        worker_id: &WorkerId,
        kind: &str,
        payload: &serde_json::Value,
    ) -> Result<Event, StoreError> {
        let conn = self.conn.lock();
        let event = insert_event(&conn, worker_id.as_str(), kind, payload)?;
        tracing::debug!(event = %event.summary(), "pushed");
        Ok(event)
    }

    /// The single event with the smallest id greater than `since`, if any.
    pub fn next_after(&self, since: i64) -> Result<Option<Event>, StoreError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, timestamp, type, worker_id, payload FROM events
             WHERE id > ?1 ORDER BY id LIMIT 1",
            params![since],
            row_to_event,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Events with id greater than `since`, ascending, optionally filtered.
    pub fn range_after(
        &self,
        since: i64,
        limit: Option<usize>,
        filter: &EventFilter,
    ) -> Result<Vec<Event>, StoreError> {
        let mut sql = String::from(
            "SELECT id, timestamp, type, worker_id, payload FROM events WHERE id > ?",
        );
        let mut args: Vec<Arg> = vec![Arg::Int(since)];

        if let Some(worker) = &filter.omit_worker {
            sql.push_str(" AND worker_id <> ?");
            args.push(Arg::Text(worker.as_str().to_string()));
        }
        if let Some(worker) = &filter.only_worker {
            sql.push_str(" AND worker_id = ?");
            args.push(Arg::Text(worker.as_str().to_string()));
        }
        if let Some(kind) = &filter.only_kind {
            sql.push_str(" AND type = ?");
            args.push(Arg::Text(kind.clone()));
        }

        let tail = filter.tail;
        match tail {
            Some(n) => {
                sql.push_str(" ORDER BY id DESC LIMIT ?");
                args.push(Arg::Int(n as i64));
            }
            None => {
                sql.push_str(" ORDER BY id ASC");
                if let Some(n) = limit {
                    sql.push_str(" LIMIT ?");
                    args.push(Arg::Int(n as i64));
                }
            }
        }

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), row_to_event)?;
        let mut events = rows.collect::<Result<Vec<_>, _>>()?;
        if tail.is_some() {
            events.reverse();
        }
        Ok(events)
    }

    /// Highest id in the log, 0 when empty. Worker lag is `head - since`.
    pub fn head(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COALESCE(MAX(id), 0) FROM events", [], |row| row.get(0))
            .map_err(Into::into)
    }

    /// The worker's cursor, 0 when the worker has never been seen.
    pub fn cursor(&self, worker_id: &WorkerId) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        let since = conn
            .query_row(
                "SELECT since FROM cursors WHERE worker_id = ?1",
                params![worker_id.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(since.unwrap_or(0))
    }

    /// Persist the cursor, inserting or overwriting.
    pub fn set_cursor(&self, worker_id: &WorkerId, since: i64) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO cursors (worker_id, since, timestamp) VALUES (?1, ?2, unixepoch())
             ON CONFLICT(worker_id) DO UPDATE
                 SET since = excluded.since, timestamp = excluded.timestamp",
            params![worker_id.as_str(), since],
        )?;
        Ok(())
    }

    /// Return the cursor, registering the worker at the head of the log if
    /// it has none.
    ///
    /// Registration appends a synthetic `cursor.create` event and sets the
    /// cursor to that event's id, atomically — a newly appearing worker
    /// starts from now, and the log records that it appeared. The new
    /// worker never observes its own registration event.
    pub fn get_or_init_cursor(&self, worker_id: &WorkerId) -> Result<i64, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing = tx
            .query_row(
                "SELECT since FROM cursors WHERE worker_id = ?1",
                params![worker_id.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        let since = match existing {
            Some(since) => since,
            None => {
                let event =
                    insert_event(&tx, worker_id.as_str(), names::CURSOR_CREATE, &json!({}))?;
                tx.execute(
                    "INSERT INTO cursors (worker_id, since, timestamp)
                     VALUES (?1, ?2, unixepoch())",
                    params![worker_id.as_str(), event.id],
                )?;
                tracing::info!(worker = %worker_id, since = event.id, "registered cursor");
                event.id
            }
        };
        tx.commit()?;
        Ok(since)
    }

    /// First-writer-wins reservation on an event id.
    ///
    /// Returns true when the caller holds the claim after the call — either
    /// it won the insert (a `claim.created` event is appended in the same
    /// transaction) or it already held it. Returns false when another
    /// worker holds it. The claims table carries no foreign key, so
    /// claiming an id that was never pushed also succeeds.
    pub fn claim(&self, worker_id: &WorkerId, event_id: i64) -> Result<bool, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO claims (event_id, worker_id) VALUES (?1, ?2)",
            params![event_id, worker_id.as_str()],
        )?;
        let won = if inserted == 1 {
            insert_event(
                &tx,
                worker_id.as_str(),
                names::CLAIM_CREATED,
                &json!({ "event_id": event_id }),
            )?;
            true
        } else {
            let holder: Option<String> = tx
                .query_row(
                    "SELECT worker_id FROM claims WHERE event_id = ?1",
                    params![event_id],
                    |row| row.get(0),
                )
                .optional()?;
            holder.as_deref() == Some(worker_id.as_str())
        };
        tx.commit()?;
        Ok(won)
    }

    /// Current holder of the claim on `event_id`, if any.
    pub fn claimant(&self, event_id: i64) -> Result<Option<WorkerId>, StoreError> {
        let conn = self.conn.lock();
        let holder: Option<String> = conn
            .query_row(
                "SELECT worker_id FROM claims WHERE event_id = ?1",
                params![event_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(holder.map(WorkerId::new))
    }
}

/// Insert within the caller's connection or transaction; used by `push`
/// and by the operations that append inside their own transaction.
fn insert_event(
    conn: &Connection,
    worker_id: &str,
    kind: &str,
    payload: &serde_json::Value,
) -> Result<Event, StoreError> {
    let text = serde_json::to_string(payload)?;
    let (id, timestamp) = conn.query_row(
        "INSERT INTO events (type, worker_id, payload) VALUES (?1, ?2, ?3)
         RETURNING id, timestamp",
        params![kind, worker_id, text],
        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
    )?;
    Ok(Event {
        id,
        timestamp,
        kind: kind.to_string(),
        worker_id: WorkerId::new(worker_id),
        payload: payload.clone(),
    })
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<Event> {
    let id: i64 = row.get(0)?;
    let raw: String = row.get(4)?;
    // Malformed payloads are delivered as the raw text, never dropped.
    let payload = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(event_id = id, error = %e, "undecodable payload, delivering raw");
            serde_json::Value::String(raw)
        }
    };
    Ok(Event {
        id,
        timestamp: row.get(1)?,
        kind: row.get(2)?,
        worker_id: WorkerId::new(row.get::<_, String>(3)?),
        payload,
    })
}

/// Bind argument for dynamically assembled filters.
enum Arg {
    Int(i64),
    Text(String),
}

impl ToSql for Arg {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Arg::Int(i) => i.to_sql(),
            Arg::Text(s) => s.to_sql(),
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

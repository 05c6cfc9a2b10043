// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hive_core::names;

fn wid(s: &str) -> WorkerId {
    WorkerId::new(s)
}

#[test]
fn push_assigns_strictly_increasing_ids() {
    let store = EventStore::in_memory().unwrap();
    let a = store.push(&wid("u"), "t.a", &json!({})).unwrap();
    let b = store.push(&wid("u"), "t.b", &json!({})).unwrap();
    let c = store.push(&wid("v"), "t.c", &json!({})).unwrap();
    assert!(a.id > 0);
    assert!(b.id > a.id);
    assert!(c.id > b.id);
}

#[test]
fn push_then_range_round_trips_payload() {
    let store = EventStore::in_memory().unwrap();
    let payload = json!({"nested": {"k": [1, 2, 3]}, "s": "x"});
    store.push(&wid("w"), "t.created", &payload).unwrap();

    let events = store.range_after(0, None, &EventFilter::default()).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].worker_id, "w");
    assert_eq!(events[0].kind, "t.created");
    assert_eq!(events[0].payload, payload);
    assert!(events[0].timestamp > 0);
}

#[test]
fn next_after_returns_smallest_greater_id() {
    let store = EventStore::in_memory().unwrap();
    assert!(store.next_after(0).unwrap().is_none());

    let a = store.push(&wid("u"), "t.a", &json!({})).unwrap();
    let b = store.push(&wid("u"), "t.b", &json!({})).unwrap();

    let next = store.next_after(0).unwrap().unwrap();
    assert_eq!(next.id, a.id);
    let next = store.next_after(a.id).unwrap().unwrap();
    assert_eq!(next.id, b.id);
    assert!(store.next_after(b.id).unwrap().is_none());
}

#[test]
fn range_filters_compose() {
    let store = EventStore::in_memory().unwrap();
    store.push(&wid("u"), "t.a", &json!({})).unwrap();
    store.push(&wid("v"), "t.a", &json!({})).unwrap();
    store.push(&wid("u"), "t.b", &json!({})).unwrap();

    let only_u = EventFilter { only_worker: Some(wid("u")), ..Default::default() };
    assert_eq!(store.range_after(0, None, &only_u).unwrap().len(), 2);

    let omit_u = EventFilter { omit_worker: Some(wid("u")), ..Default::default() };
    let events = store.range_after(0, None, &omit_u).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].worker_id, "v");

    let only_ta = EventFilter { only_kind: Some("t.a".to_string()), ..Default::default() };
    assert_eq!(store.range_after(0, None, &only_ta).unwrap().len(), 2);

    assert_eq!(store.range_after(0, Some(2), &EventFilter::default()).unwrap().len(), 2);
}

#[test]
fn tail_returns_last_n_ascending() {
    let store = EventStore::in_memory().unwrap();
    for i in 0..5 {
        store.push(&wid("u"), &format!("t.{i}"), &json!({})).unwrap();
    }
    let filter = EventFilter { tail: Some(2), ..Default::default() };
    let events = store.range_after(0, None, &filter).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, "t.3");
    assert_eq!(events[1].kind, "t.4");
    assert!(events[0].id < events[1].id);
}

#[test]
fn cursor_defaults_to_zero_and_overwrites() {
    let store = EventStore::in_memory().unwrap();
    assert_eq!(store.cursor(&wid("w")).unwrap(), 0);

    store.set_cursor(&wid("w"), 5).unwrap();
    assert_eq!(store.cursor(&wid("w")).unwrap(), 5);

    store.set_cursor(&wid("w"), 9).unwrap();
    assert_eq!(store.cursor(&wid("w")).unwrap(), 9);
}

#[test]
fn get_or_init_registers_at_head() {
    let store = EventStore::in_memory().unwrap();
    store.push(&wid("u"), "t.old", &json!({})).unwrap();

    let since = store.get_or_init_cursor(&wid("fresh")).unwrap();

    // The cursor sits on the synthetic registration event, so the worker
    // starts from now and never sees its own registration.
    let create = store.next_after(since - 1).unwrap().unwrap();
    assert_eq!(create.id, since);
    assert_eq!(create.kind, names::CURSOR_CREATE);
    assert_eq!(create.worker_id, "fresh");
    assert!(store.next_after(since).unwrap().is_none());
}

#[test]
fn get_or_init_is_stable_on_reinvocation() {
    let store = EventStore::in_memory().unwrap();
    let first = store.get_or_init_cursor(&wid("w")).unwrap();
    let second = store.get_or_init_cursor(&wid("w")).unwrap();
    assert_eq!(first, second);

    // Exactly one registration event was written.
    let filter = EventFilter { only_kind: Some(names::CURSOR_CREATE.to_string()), ..Default::default() };
    assert_eq!(store.range_after(0, None, &filter).unwrap().len(), 1);
}

#[test]
fn get_or_init_respects_existing_cursor() {
    let store = EventStore::in_memory().unwrap();
    store.set_cursor(&wid("w"), 3).unwrap();
    assert_eq!(store.get_or_init_cursor(&wid("w")).unwrap(), 3);
}

#[test]
fn claim_is_first_writer_wins() {
    let store = EventStore::in_memory().unwrap();
    let event = store.push(&wid("u"), "task.ready", &json!({})).unwrap();

    assert!(store.claim(&wid("c1"), event.id).unwrap());
    assert!(!store.claim(&wid("c2"), event.id).unwrap());
    assert_eq!(store.claimant(event.id).unwrap().unwrap(), "c1");
}

#[test]
fn claim_is_idempotent_for_the_holder() {
    let store = EventStore::in_memory().unwrap();
    let event = store.push(&wid("u"), "task.ready", &json!({})).unwrap();

    assert!(store.claim(&wid("c1"), event.id).unwrap());
    assert!(store.claim(&wid("c1"), event.id).unwrap());

    // Only the winning insert appends claim.created.
    let filter = EventFilter { only_kind: Some(names::CLAIM_CREATED.to_string()), ..Default::default() };
    let created = store.range_after(0, None, &filter).unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].payload, json!({"event_id": event.id}));
    assert_eq!(created[0].worker_id, "c1");
}

#[test]
fn claim_on_missing_event_succeeds() {
    // The claims table has no foreign key to events; uniqueness is the
    // only constraint.
    let store = EventStore::in_memory().unwrap();
    assert!(store.claim(&wid("c1"), 9999).unwrap());
    assert_eq!(store.claimant(9999).unwrap().unwrap(), "c1");
}

#[test]
fn claimant_absent_when_unclaimed() {
    let store = EventStore::in_memory().unwrap();
    assert!(store.claimant(1).unwrap().is_none());
}

#[test]
fn malformed_payload_is_delivered_raw() {
    let store = EventStore::in_memory().unwrap();
    store
        .conn
        .lock()
        .execute(
            "INSERT INTO events (type, worker_id, payload) VALUES ('t.x', 'w', 'not json')",
            [],
        )
        .unwrap();

    let events = store.range_after(0, None, &EventFilter::default()).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload, serde_json::Value::String("not json".to_string()));
}

#[test]
fn head_tracks_highest_id() {
    let store = EventStore::in_memory().unwrap();
    assert_eq!(store.head().unwrap(), 0);
    let e = store.push(&wid("u"), "t.a", &json!({})).unwrap();
    assert_eq!(store.head().unwrap(), e.id);
}

#[test]
fn two_handles_share_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.db");

    let writer = EventStore::open(&path).unwrap();
    let reader = EventStore::open(&path).unwrap();

    let pushed = writer.push(&wid("u"), "t.shared", &json!({"n": 1})).unwrap();
    let seen = reader.next_after(0).unwrap().unwrap();
    assert_eq!(seen.id, pushed.id);
    assert_eq!(seen.payload, json!({"n": 1}));
}

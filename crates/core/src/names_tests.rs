// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn worker_lifecycle_names_embed_the_id() {
    let id = WorkerId::new("reviewer");
    assert_eq!(worker_start(&id), "sys.worker.reviewer.start");
    assert_eq!(worker_finish(&id), "sys.worker.reviewer.finish");
    assert_eq!(worker_error(&id), "sys.worker.reviewer.error");
}

#[test]
fn lifecycle_names_are_prefix_matchable() {
    // Dashboards subscribe with `sys.*`; the constants must stay under it.
    for name in [
        LIFECYCLE_START,
        LIFECYCLE_FINISH,
        AGENT_CREATE,
        AGENT_RELOAD,
        AGENT_REMOVE,
        AGENT_ERROR,
    ] {
        assert!(crate::pattern::matches(name, &["sys.*".to_string()]));
    }
}

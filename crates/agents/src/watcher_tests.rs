// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hive_storage::EventFilter;

use ChangeClass::{Create, Modify, Remove};

#[yare::parameterized(
    create_wins = { &[Modify, Create, Modify], Create },
    pure_remove = { &[Remove, Remove], Remove },
    modify_otherwise = { &[Modify], Modify },
    remove_then_modify = { &[Remove, Modify], Modify },
)]
fn projection(classes: &[ChangeClass], expected: ChangeClass) {
    assert_eq!(project(classes), expected);
}

struct Harness {
    _dir: tempfile::TempDir,
    agents: PathBuf,
    store: EventStore,
    supervisor: Supervisor,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let agents = dir.path().join("agents");
    std::fs::create_dir(&agents).unwrap();

    let store = EventStore::in_memory().unwrap();
    let shutdown = CancellationToken::new();
    let supervisor = Supervisor::new(store.clone(), shutdown.clone())
        .with_poll_interval(Duration::from_millis(20));
    let runner = AgentRunnerConfig::new("/tmp/events.db").with_agent_command("true");

    let task = AgentWatcher::new(&agents)
        .spawn(supervisor.clone(), store.clone(), runner, Vec::new(), shutdown.clone())
        .unwrap();

    Harness { _dir: dir, agents, store, supervisor, shutdown, task }
}

impl Harness {
    async fn wait_for_sys_event(&self, kind: &str, min_count: usize) -> Vec<hive_core::Event> {
        for _ in 0..80 {
            let filter = EventFilter { only_kind: Some(kind.to_string()), ..Default::default() };
            let events = self.store.range_after(0, None, &filter).unwrap();
            if events.len() >= min_count {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("{kind} did not reach count {min_count}");
    }

    async fn finish(self) {
        self.shutdown.cancel();
        self.task.await.unwrap();
        self.supervisor.stop().await;
    }
}

const VALID: &str = "---\ntype: shell-template\nlisten: [\"t.*\"]\n---\ntrue\n";
const REWRITTEN: &str = "---\ntype: shell-template\nlisten: [\"t.*\"]\n---\necho changed\n";

#[tokio::test]
async fn create_rewrite_remove_cycle() {
    let h = harness();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Appearing file spawns a worker and emits create.
    std::fs::write(h.agents.join("demo.md"), VALID).unwrap();
    let creates = h.wait_for_sys_event(names::AGENT_CREATE, 1).await;
    assert_eq!(creates[0].payload, serde_json::json!({ "agent_id": "demo" }));
    assert_eq!(creates[0].worker_id, names::SYS_WORKER);
    assert!(h.supervisor.is_live(&WorkerId::new("demo")));

    // Rewriting replaces the worker under the same id and emits reload.
    std::fs::write(h.agents.join("demo.md"), REWRITTEN).unwrap();
    let reloads = h.wait_for_sys_event(names::AGENT_RELOAD, 1).await;
    assert_eq!(reloads[0].payload, serde_json::json!({ "agent_id": "demo" }));
    assert!(h.supervisor.is_live(&WorkerId::new("demo")));

    // Deleting kills the worker and emits remove.
    std::fs::remove_file(h.agents.join("demo.md")).unwrap();
    h.wait_for_sys_event(names::AGENT_REMOVE, 1).await;
    for _ in 0..80 {
        if !h.supervisor.is_live(&WorkerId::new("demo")) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(!h.supervisor.is_live(&WorkerId::new("demo")));

    h.finish().await;
}

#[tokio::test]
async fn malformed_definition_emits_error_and_spawns_nothing() {
    let h = harness();
    tokio::time::sleep(Duration::from_millis(100)).await;

    std::fs::write(h.agents.join("broken.md"), "no header at all\n").unwrap();

    let errors = h.wait_for_sys_event(names::AGENT_ERROR, 1).await;
    assert_eq!(errors[0].payload["agent_id"], "broken");
    assert!(errors[0].payload["path"].as_str().unwrap().ends_with("broken.md"));
    assert!(!errors[0].payload["error"].as_str().unwrap().is_empty());
    assert!(!h.supervisor.is_live(&WorkerId::new("broken")));

    h.finish().await;
}

#[tokio::test]
async fn parse_failure_leaves_the_old_worker_running() {
    let h = harness();
    tokio::time::sleep(Duration::from_millis(100)).await;

    std::fs::write(h.agents.join("demo.md"), VALID).unwrap();
    h.wait_for_sys_event(names::AGENT_CREATE, 1).await;

    // Break the file: the error is reported, the worker stays.
    std::fs::write(h.agents.join("demo.md"), "listen: [\"t.*\"]\nno delimiters\n").unwrap();
    h.wait_for_sys_event(names::AGENT_ERROR, 1).await;
    assert!(h.supervisor.is_live(&WorkerId::new("demo")));

    h.finish().await;
}

#[tokio::test]
async fn non_md_files_are_ignored() {
    let h = harness();
    tokio::time::sleep(Duration::from_millis(100)).await;

    std::fs::write(h.agents.join("README.txt"), "not an agent").unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    let filter = EventFilter {
        only_worker: Some(WorkerId::new(names::SYS_WORKER)),
        ..Default::default()
    };
    assert!(h.store.range_after(0, None, &filter).unwrap().is_empty());

    h.finish().await;
}

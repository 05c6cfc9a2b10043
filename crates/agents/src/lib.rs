// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive-agents: agent definitions and the workers built from them.
//!
//! An agent is a text file: a `---`-delimited YAML header (subscription,
//! kind, subprocess options) followed by a verbatim body — a prompt for
//! interactive agents, a shell template for shell agents. This crate parses
//! those files, turns them into supervisor workers whose effects spawn
//! subprocesses, and hot-reloads them when the definition directory
//! changes.

pub mod definition;
pub mod loader;
pub mod runner;
pub mod slug;
pub mod watcher;

pub use definition::{AgentDefinition, AgentKind, DefinitionError};
pub use loader::load_dir;
pub use runner::{worker_for, AgentRunnerConfig};
pub use watcher::{AgentWatcher, WatcherError};

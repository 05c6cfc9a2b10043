// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hive run` — host the runtime in the foreground.

use anyhow::Result;
use clap::Args;
use hive_runtime::{Config, Runtime};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Args)]
pub struct RunArgs {
    /// Agent definition directory
    #[arg(long, default_value = "agents")]
    agents: PathBuf,

    /// Watch a path recursively and publish file.* events (repeatable)
    #[arg(long = "watch")]
    watch: Vec<PathBuf>,

    /// Replace the default exclude globs (repeatable)
    #[arg(long = "exclude")]
    exclude: Vec<String>,

    /// Dispatch poll interval in seconds
    #[arg(long, default_value_t = 1.0)]
    poll: f64,

    /// Command used to run interactive agents
    #[arg(long = "agent-cmd", default_value = "claude")]
    agent_cmd: String,
}

pub async fn handle(args: RunArgs, db: &Path) -> Result<()> {
    let mut config = Config::new(db);
    config.agents_dir = args.agents;
    config.watch_paths = args.watch;
    if !args.exclude.is_empty() {
        config.exclude = args.exclude;
    }
    config.poll_interval = Duration::from_secs_f64(args.poll.max(0.05));
    config.agent_command = args.agent_cmd;

    let runtime = Runtime::start(config)?;
    let cancelled = runtime.cancelled();

    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupt received"),
        _ = sigterm.recv() => tracing::info!("terminate received"),
        _ = cancelled.cancelled() => tracing::info!("component requested shutdown"),
    }

    runtime.shutdown().await;
    Ok(())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive: command-line surface over the shared event log.
//!
//! Every subcommand opens the store file directly; there is no daemon
//! socket. `hive run` hosts the agent runtime in the foreground, and any
//! number of `hive events` invocations — including ones made by agent
//! subprocesses — coordinate with it through the same file.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hive", version, about = "Multi-agent coordination over a durable event log")]
struct Cli {
    /// Store file shared by all commands.
    #[arg(long, global = true, env = "HIVE_DB", default_value = "events.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append to and inspect the event log
    Events(commands::events::EventsArgs),
    /// Run the agent runtime in the foreground until interrupted
    Run(commands::run::RunArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only line-delimited JSON.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Events(args) => commands::events::handle(args, &cli.db).await,
        Command::Run(args) => commands::run::handle(args, &cli.db).await,
    }
}

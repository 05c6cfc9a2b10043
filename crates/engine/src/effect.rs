// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The effect seam: user work executed for a matched event.

use async_trait::async_trait;
use hive_core::Event;
use tokio_util::sync::CancellationToken;

/// Why an effect did not succeed.
///
/// `Cancelled` is deliberately separate from failure: a cancelled effect
/// is reported as neither `sys.worker.<id>.finish` nor `.error`.
#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    #[error("subprocess error: {0}")]
    Subprocess(#[from] std::io::Error),

    #[error("exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

/// User-supplied work run once per matched event.
///
/// The supervisor places no timeout on effects; the token is the only
/// cancellation channel and is signalled on `kill`/`stop`. A cooperative
/// effect races its own subprocess wait against the token and returns
/// promptly when it fires.
#[async_trait]
pub trait Effect: Send + Sync {
    async fn run(&self, event: &Event, cancel: CancellationToken) -> Result<(), EffectError>;
}

//! Utility module
//!
//! This module provides the wall clock used to stamp messages and the
//! signal hook that triggers shutdown.

use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::core::Result;

/// Current wall clock time in milliseconds since the Unix epoch
pub fn epoch_ms_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Cancels `shutdown` on SIGINT or SIGTERM
///
/// The handlers are installed before this returns, so registration failures
/// surface as startup errors. The spawned task also ends once `shutdown` is
/// cancelled by someone else. Cancelling more than once is harmless.
pub fn shutdown_on_signal(shutdown: CancellationToken) -> Result<JoinHandle<()>> {
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = terminate.recv() => info!("Received SIGTERM"),
            _ = interrupt.recv() => info!("Received SIGINT"),
            _ = shutdown.cancelled() => return,
        }
        shutdown.cancel();
    }))
}

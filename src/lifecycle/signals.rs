//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for Ctrl-C (SIGINT)
//! - Translate it into cancellation of the in-flight transfer
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Cancellation, not process exit: the driver still resolves its latch

use crate::transfer::CancelHandle;

/// Wait for Ctrl-C, then cancel the transfer behind `cancel`.
pub async fn cancel_on_ctrl_c(cancel: CancelHandle) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::warn!("Interrupt received, cancelling transfer");
            cancel.cancel();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for interrupt signal");
        }
    }
}

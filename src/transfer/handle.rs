//! Transfer identity, state observation and cancellation.
//!
//! # State Transitions
//! ```text
//! Idle → Sending: driver starts writing the head
//! Sending → Completed: terminal marker written and flushed
//! Sending → Failed: read/write error, length mismatch or cancellation
//! ```
//!
//! `Completed` and `Failed` are terminal; the driver is consumed on entry.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use crate::transfer::latch::{completion_latch, CompletionLatch, LatchSignal, TransferOutcome};

/// Unique identifier for a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TransferId(Uuid);

impl TransferId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "xfer-{}", self.0)
    }
}

/// Driver lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransferState {
    Idle,
    Sending,
    Completed,
    Failed,
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Completed | TransferState::Failed)
    }
}

/// Cloneable trigger that aborts a transfer.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Driver-side view of cancellation.
#[derive(Debug)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Never resolves if every
    /// [`CancelHandle`] is dropped first.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Everything the driver needs to report on a transfer.
#[derive(Debug)]
pub struct TransferContext {
    id: TransferId,
    cancel: CancelSignal,
    state: watch::Sender<TransferState>,
    signal: LatchSignal,
}

impl TransferContext {
    pub fn id(&self) -> TransferId {
        self.id
    }

    pub(crate) fn set_state(&self, state: TransferState) {
        self.state.send_replace(state);
    }

    pub(crate) fn cancel_signal(&mut self) -> &mut CancelSignal {
        &mut self.cancel
    }

    /// Enter the terminal state and resolve the latch.
    pub(crate) fn resolve(self, outcome: TransferOutcome) {
        let state = if outcome.is_ok() {
            TransferState::Completed
        } else {
            TransferState::Failed
        };
        self.set_state(state);
        self.signal.release(outcome);
    }

    /// Fail a transfer that never reached the driver (e.g. connect failure).
    pub fn abort(self, error: crate::transfer::TransferError) {
        tracing::warn!(transfer_id = %self.id, error = %error, "Transfer aborted before sending");
        self.resolve(Err(error));
    }
}

/// Caller-side handle: identity, state, cancellation and the completion latch.
#[derive(Debug)]
pub struct TransferHandle {
    id: TransferId,
    cancel: CancelHandle,
    state: watch::Receiver<TransferState>,
    latch: CompletionLatch,
}

impl TransferHandle {
    pub fn id(&self) -> TransferId {
        self.id
    }

    /// Abort the transfer. Bytes already written are not retracted.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn state(&self) -> TransferState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn state_receiver(&self) -> watch::Receiver<TransferState> {
        self.state.clone()
    }

    /// Wait for the terminal outcome.
    pub async fn wait(self) -> TransferOutcome {
        self.latch.wait().await
    }

    pub fn into_latch(self) -> CompletionLatch {
        self.latch
    }
}

/// Start tracking a new transfer.
pub fn begin() -> (TransferHandle, TransferContext) {
    let id = TransferId::new();
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let (state_tx, state_rx) = watch::channel(TransferState::Idle);
    let (signal, latch) = completion_latch();

    let handle = TransferHandle {
        id,
        cancel: CancelHandle {
            tx: Arc::new(cancel_tx),
        },
        state: state_rx,
        latch,
    };
    let context = TransferContext {
        id,
        cancel: CancelSignal { rx: cancel_rx },
        state: state_tx,
        signal,
    };
    (handle, context)
}

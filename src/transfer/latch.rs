//! One-shot completion signal.
//!
//! The driver holds the [`LatchSignal`], the caller holds the
//! [`CompletionLatch`]. Releasing consumes the signal, so a transfer can only
//! be resolved once. A signal dropped without being released resolves the
//! latch with [`TransferError::Interrupted`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::transfer::{TransferError, TransferSummary};

/// Terminal result of a transfer.
pub type TransferOutcome = Result<TransferSummary, TransferError>;

/// Create a connected signal/latch pair.
pub fn completion_latch() -> (LatchSignal, CompletionLatch) {
    let (tx, rx) = oneshot::channel();
    (LatchSignal { tx }, CompletionLatch { rx })
}

/// Writer side, owned by the transfer driver.
#[derive(Debug)]
pub struct LatchSignal {
    tx: oneshot::Sender<TransferOutcome>,
}

impl LatchSignal {
    /// Resolve the latch.
    pub fn release(self, outcome: TransferOutcome) {
        // Caller may have stopped waiting; the outcome is simply dropped then.
        let _ = self.tx.send(outcome);
    }
}

/// Reader side. Await it (or call [`CompletionLatch::wait_blocking`]) for the outcome.
#[derive(Debug)]
pub struct CompletionLatch {
    rx: oneshot::Receiver<TransferOutcome>,
}

impl CompletionLatch {
    /// Wait for the transfer to finish.
    pub async fn wait(self) -> TransferOutcome {
        self.await
    }

    /// Blocking wait for thread-per-transfer callers. Must not run on an async worker.
    pub fn wait_blocking(self) -> TransferOutcome {
        self.rx
            .blocking_recv()
            .unwrap_or(Err(TransferError::Interrupted))
    }

    /// Outcome if already released, without waiting.
    pub fn try_outcome(&mut self) -> Option<TransferOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(TransferError::Interrupted)),
        }
    }
}

impl Future for CompletionLatch {
    type Output = TransferOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(Err(TransferError::Interrupted)))
    }
}

//! Progress accounting.
//!
//! # Responsibilities
//! - Accumulate body bytes actually flushed to the transport
//! - Notify the observer once per completed write, in submission order
//! - Guarantee one final notification even for an empty body
//!
//! Chunk framing overhead is never counted; only body bytes are.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::body::Framing;
use crate::transfer::{TransferError, TransferId};

/// Point-in-time report of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    /// Body bytes written so far.
    pub bytes_sent: u64,
    /// Total body bytes, or `None` for a stream of unknown length.
    pub total_bytes: Option<u64>,
}

impl std::fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.total_bytes {
            Some(total) => write!(f, "progress={}, total={}", self.bytes_sent, total),
            None => write!(f, "progress={}, total=unknown", self.bytes_sent),
        }
    }
}

/// Final accounting of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    pub transfer_id: TransferId,
    pub bytes_sent: u64,
    pub total_bytes: Option<u64>,
    pub framing: Framing,
    /// Number of body writes issued (the chunked terminator is not counted).
    pub writes: u64,
}

/// Receives progress snapshots and the terminal outcome of one transfer.
///
/// Calls for one transfer never overlap and arrive in write order.
pub trait ProgressObserver: Send {
    fn on_progress(&mut self, snapshot: ProgressSnapshot);

    fn on_finish(&mut self, _outcome: Result<&TransferSummary, &TransferError>) {}
}

impl ProgressObserver for () {
    fn on_progress(&mut self, _snapshot: ProgressSnapshot) {}
}

impl<F> ProgressObserver for F
where
    F: FnMut(ProgressSnapshot) + Send,
{
    fn on_progress(&mut self, snapshot: ProgressSnapshot) {
        self(snapshot)
    }
}

/// Channel observer. A closed receiver is ignored; the sender drops with the driver.
impl ProgressObserver for mpsc::UnboundedSender<ProgressSnapshot> {
    fn on_progress(&mut self, snapshot: ProgressSnapshot) {
        let _ = self.send(snapshot);
    }
}

/// Running total for one transfer.
pub struct ProgressTracker<O> {
    observer: O,
    bytes_sent: u64,
    total_bytes: Option<u64>,
    notifications: u64,
}

impl<O: ProgressObserver> ProgressTracker<O> {
    pub fn new(observer: O, total_bytes: Option<u64>) -> Self {
        Self {
            observer,
            bytes_sent: 0,
            total_bytes,
            notifications: 0,
        }
    }

    /// Record one completed write of `chunk_size` body bytes.
    pub fn on_bytes_written(&mut self, chunk_size: u64) -> ProgressSnapshot {
        if chunk_size > 0 {
            self.bytes_sent += chunk_size;
            self.notify();
        }
        self.snapshot()
    }

    /// Close accounting. Emits the single terminal snapshot of an empty body.
    pub fn finish(&mut self) -> ProgressSnapshot {
        if self.notifications == 0 {
            self.notify();
        }
        self.snapshot()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            bytes_sent: self.bytes_sent,
            total_bytes: self.total_bytes,
        }
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Number of observer notifications so far.
    pub fn notifications(&self) -> u64 {
        self.notifications
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    fn notify(&mut self) {
        self.notifications += 1;
        let snapshot = self.snapshot();
        self.observer.on_progress(snapshot);
    }
}

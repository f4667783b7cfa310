//! Transfer error kinds.

use thiserror::Error;

/// Errors that end a transfer. None of them are retried here.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The body source failed to produce requested bytes.
    #[error("body source read failed: {0}")]
    SourceRead(#[source] std::io::Error),

    /// The connection write failed.
    #[error("transport write failed: {0}")]
    TransportWrite(#[source] std::io::Error),

    /// Fewer bytes were available than the declared length.
    #[error("body length mismatch: declared {declared} bytes, only {actual} available")]
    LengthMismatch { declared: u64, actual: u64 },

    /// The caller aborted the transfer.
    #[error("transfer cancelled")]
    Cancelled,

    /// The connection could not be established.
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    /// The driver went away without reporting an outcome.
    #[error("transfer driver exited without an outcome")]
    Interrupted,
}

impl TransferError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TransferError::SourceRead(_) => "source_read",
            TransferError::TransportWrite(_) => "transport_write",
            TransferError::LengthMismatch { .. } => "length_mismatch",
            TransferError::Cancelled => "cancelled",
            TransferError::Connect(_) => "connect",
            TransferError::Interrupted => "interrupted",
        }
    }
}

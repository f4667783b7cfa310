//! Transfer driver.
//!
//! # Responsibilities
//! - Write the request head, then pull the body from its source in bounded pieces
//! - Wrap each piece per the selected framing and write it to the connection
//! - Report every completed write to the progress tracker, in order
//! - Write the terminal marker and resolve the completion latch exactly once
//!
//! # Design Decisions
//! - One write in flight at a time; the next piece is read only after the
//!   previous write (and its flush) completed
//! - Cancellation is checked before each read and each write (the terminal
//!   marker included) and raced against both; an interrupted write is never
//!   reported as progress, a completed one always is
//! - Any error ends the transfer; nothing is retried here

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::Instrument;

use crate::body::{BodySource, Framing};
use crate::config::TransferConfig;
use crate::observability::metrics;
use crate::transfer::handle::{CancelSignal, TransferContext, TransferState};
use crate::transfer::progress::{ProgressObserver, ProgressTracker, TransferSummary};
use crate::transfer::TransferError;

/// Size limits and deadlines for one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Upper bound on body bytes per write.
    pub max_write_size: usize,
    /// Read size for stream sources (capped at `max_write_size`).
    pub stream_chunk_size: usize,
    /// Deadline for a single write, including its flush.
    pub write_timeout: Option<Duration>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::from(&TransferConfig::default())
    }
}

impl From<&TransferConfig> for DriverConfig {
    fn from(config: &TransferConfig) -> Self {
        Self {
            max_write_size: config.max_write_size,
            stream_chunk_size: config.stream_chunk_size,
            write_timeout: match config.write_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

impl DriverConfig {
    fn read_size(&self, source: &BodySource) -> usize {
        let size = if source.is_stream() {
            self.stream_chunk_size.min(self.max_write_size)
        } else {
            self.max_write_size
        };
        size.max(1)
    }
}

/// Drives one body onto one connection.
pub struct TransferDriver<W, O> {
    context: TransferContext,
    source: BodySource,
    framing: Framing,
    connection: W,
    tracker: ProgressTracker<O>,
    config: DriverConfig,
    head: Option<Vec<u8>>,
    writes: u64,
}

impl<W, O> TransferDriver<W, O>
where
    W: AsyncWrite + Unpin + Send,
    O: ProgressObserver,
{
    pub fn new(
        context: TransferContext,
        source: BodySource,
        connection: W,
        observer: O,
        config: DriverConfig,
    ) -> Self {
        let framing = Framing::select(source.known_length());
        Self {
            context,
            source,
            framing,
            connection,
            tracker: ProgressTracker::new(observer, framing.total()),
            config,
            head: None,
            writes: 0,
        }
    }

    /// Encoded request head to write before the body.
    pub fn with_head(mut self, encoded: Vec<u8>) -> Self {
        self.head = Some(encoded);
        self
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Run to a terminal state.
    ///
    /// The outcome is delivered through the completion latch. The connection
    /// is handed back, along with the summary on success, so the caller can
    /// read the response.
    pub async fn run(mut self) -> (W, Option<TransferSummary>) {
        let id = self.context.id();
        let span = tracing::debug_span!("transfer", transfer_id = %id, framing = %self.framing);

        async move {
            let started = Instant::now();
            self.context.set_state(TransferState::Sending);
            metrics::record_transfer_started(self.framing.label());
            tracing::debug!(total = ?self.framing.total(), "Transfer started");

            let outcome = self.pump().await;
            let elapsed = started.elapsed();

            match &outcome {
                Ok(summary) => {
                    tracing::info!(
                        bytes_sent = summary.bytes_sent,
                        writes = summary.writes,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Transfer completed"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        bytes_sent = self.tracker.bytes_sent(),
                        "Transfer failed"
                    );
                }
            }
            metrics::record_transfer_finished(outcome.as_ref().err().map(|e| e.kind()), elapsed);

            self.tracker.observer_mut().on_finish(outcome.as_ref());
            let summary = outcome.as_ref().ok().cloned();
            let TransferDriver {
                context, connection, ..
            } = self;
            context.resolve(outcome);
            (connection, summary)
        }
        .instrument(span)
        .await
    }

    async fn pump(&mut self) -> Result<TransferSummary, TransferError> {
        if self.context.cancel_signal().is_cancelled() {
            return Err(TransferError::Cancelled);
        }

        if let Some(head) = self.head.take() {
            let write = write_bytes(&mut self.connection, &head, self.config.write_timeout);
            unless_cancelled(self.context.cancel_signal(), write).await?;
        }

        let read_size = self.config.read_size(&self.source);
        loop {
            if self.context.cancel_signal().is_cancelled() {
                return Err(TransferError::Cancelled);
            }

            let next = tokio::select! {
                biased;
                _ = self.context.cancel_signal().cancelled() => return Err(TransferError::Cancelled),
                next = self.source.next_chunk(read_size) => next?,
            };

            let Some(chunk) = next else {
                break;
            };

            let write = write_frame(
                &mut self.connection,
                self.framing,
                &chunk,
                self.config.write_timeout,
            );
            unless_cancelled(self.context.cancel_signal(), write).await?;

            self.writes += 1;
            let snapshot = self.tracker.on_bytes_written(chunk.len() as u64);
            metrics::record_bytes_written(chunk.len() as u64);
            tracing::trace!(chunk = chunk.len(), sent = snapshot.bytes_sent, "Chunk written");
        }

        if let Framing::LengthDelimited(declared) = self.framing {
            let sent = self.tracker.bytes_sent();
            if sent != declared {
                return Err(TransferError::LengthMismatch {
                    declared,
                    actual: sent,
                });
            }
        }

        let terminator = self.framing.terminator();
        let write = write_bytes(&mut self.connection, terminator, self.config.write_timeout);
        unless_cancelled(self.context.cancel_signal(), write).await?;

        let last = self.tracker.finish();
        Ok(TransferSummary {
            transfer_id: self.context.id(),
            bytes_sent: last.bytes_sent,
            total_bytes: last.total_bytes,
            framing: self.framing,
            writes: self.writes,
        })
    }
}

/// Issue a write unless the transfer is cancelled, racing it against cancellation.
///
/// A write that completes in the same poll as the cancel still counts; the
/// cancel is then seen before the next read.
async fn unless_cancelled<F>(signal: &mut CancelSignal, write: F) -> Result<(), TransferError>
where
    F: Future<Output = std::io::Result<()>>,
{
    if signal.is_cancelled() {
        return Err(TransferError::Cancelled);
    }
    tokio::select! {
        biased;
        res = write => res.map_err(TransferError::TransportWrite),
        _ = signal.cancelled() => Err(TransferError::Cancelled),
    }
}

/// Write one body piece with its framing, then flush.
async fn write_frame<W>(
    conn: &mut W,
    framing: Framing,
    chunk: &[u8],
    timeout: Option<Duration>,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let write = async {
        if framing.is_chunked() {
            conn.write_all(Framing::chunk_prefix(chunk.len()).as_bytes())
                .await?;
            conn.write_all(chunk).await?;
            conn.write_all(b"\r\n").await?;
        } else {
            conn.write_all(chunk).await?;
        }
        conn.flush().await
    };
    with_timeout(timeout, write).await
}

/// Write raw bytes (head or terminator), then flush.
async fn write_bytes<W>(conn: &mut W, bytes: &[u8], timeout: Option<Duration>) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let write = async {
        if !bytes.is_empty() {
            conn.write_all(bytes).await?;
        }
        conn.flush().await
    };
    with_timeout(timeout, write).await
}

async fn with_timeout<F>(timeout: Option<Duration>, fut: F) -> std::io::Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(res) => res,
            Err(_) => Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("write timed out after {:?}", limit),
            )),
        },
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::handle::{begin, CancelHandle};
    use crate::transfer::ProgressSnapshot;
    use tokio::sync::mpsc;

    fn config(max_write_size: usize) -> DriverConfig {
        DriverConfig {
            max_write_size,
            stream_chunk_size: max_write_size,
            write_timeout: None,
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ProgressSnapshot>) -> Vec<ProgressSnapshot> {
        let mut events = Vec::new();
        while let Ok(s) = rx.try_recv() {
            events.push(s);
        }
        events
    }

    #[tokio::test]
    async fn length_delimited_body_is_written_verbatim() {
        let (handle, context) = begin();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let driver = TransferDriver::new(
            context,
            BodySource::bytes(&b"hello world"[..]),
            Vec::new(),
            tx,
            config(4),
        )
        .with_head(b"HEAD\r\n\r\n".to_vec());

        let (wire, summary) = driver.run().await;
        assert_eq!(wire, b"HEAD\r\n\r\nhello world");
        assert_eq!(summary.unwrap().writes, 3);

        let sent: Vec<u64> = drain(&mut rx).iter().map(|s| s.bytes_sent).collect();
        assert_eq!(sent, vec![4, 8, 11]);
        assert_eq!(handle.state(), TransferState::Completed);
        assert_eq!(handle.wait().await.unwrap().bytes_sent, 11);
    }

    #[tokio::test]
    async fn chunked_body_is_framed_and_terminated() {
        let (handle, context) = begin();
        let driver = TransferDriver::new(
            context,
            BodySource::stream(&b"abcdefghij"[..]),
            Vec::new(),
            (),
            config(6),
        );
        assert_eq!(driver.framing(), Framing::Chunked);

        let (wire, _) = driver.run().await;
        assert_eq!(wire, b"6\r\nabcdef\r\n4\r\nghij\r\n0\r\n\r\n");

        let summary = handle.wait().await.unwrap();
        assert_eq!(summary.bytes_sent, 10);
        assert_eq!(summary.total_bytes, None);
    }

    #[tokio::test]
    async fn empty_fixed_body_reports_zero_once() {
        let (handle, context) = begin();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let driver = TransferDriver::new(context, BodySource::bytes(Vec::new()), Vec::new(), tx, config(16));

        let (wire, _) = driver.run().await;
        assert!(wire.is_empty());
        assert_eq!(
            drain(&mut rx),
            vec![ProgressSnapshot {
                bytes_sent: 0,
                total_bytes: Some(0)
            }]
        );
        assert_eq!(handle.wait().await.unwrap().writes, 0);
    }

    #[tokio::test]
    async fn cancelled_before_start_writes_nothing() {
        let (handle, context) = begin();
        handle.cancel();
        let driver = TransferDriver::new(context, BodySource::bytes(vec![1u8; 8]), Vec::new(), (), config(4))
            .with_head(b"HEAD".to_vec());

        let (wire, summary) = driver.run().await;
        assert!(wire.is_empty());
        assert!(summary.is_none());
        assert_eq!(handle.state(), TransferState::Failed);
        assert!(matches!(handle.wait().await, Err(TransferError::Cancelled)));
    }

    /// Transport that raises cancellation from inside a write once `cancel_at` bytes landed.
    struct CancellingWriter {
        wire: Vec<u8>,
        cancel: CancelHandle,
        cancel_at: usize,
    }

    impl AsyncWrite for CancellingWriter {
        fn poll_write(
            mut self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            self.wire.extend_from_slice(buf);
            if self.wire.len() >= self.cancel_at {
                self.cancel.cancel();
            }
            std::task::Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn write_completed_alongside_cancel_is_reported() {
        let (handle, context) = begin();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let writer = CancellingWriter {
            wire: Vec::new(),
            cancel: handle.cancel_handle(),
            cancel_at: 200,
        };
        let driver = TransferDriver::new(context, BodySource::bytes(vec![2u8; 1000]), writer, tx, config(100));

        let (writer, summary) = driver.run().await;
        assert!(summary.is_none());

        let sent: Vec<u64> = drain(&mut rx).iter().map(|s| s.bytes_sent).collect();
        assert_eq!(sent, vec![100, 200]);
        assert_eq!(writer.wire.len(), 200);
        assert!(matches!(handle.wait().await, Err(TransferError::Cancelled)));
    }

    #[test]
    fn stream_read_size_is_capped_by_write_size() {
        let config = DriverConfig {
            max_write_size: 1024,
            stream_chunk_size: 4096,
            write_timeout: None,
        };
        assert_eq!(config.read_size(&BodySource::stream(&b""[..])), 1024);
        assert_eq!(config.read_size(&BodySource::bytes(&b""[..])), 1024);
    }
}

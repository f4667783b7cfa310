//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Write;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::any;
use axum::Router;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use progressive_upload::ProgressSnapshot;

pub const PATTERN: &[u8] = b"RatherLargeFileRatherLargeFileRatherLargeFileRatherLargeFile";

/// Echo server that also reports every body it received.
pub struct EchoServer {
    pub addr: SocketAddr,
    pub received: mpsc::UnboundedReceiver<Bytes>,
}

impl EchoServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn echo(State(tx): State<mpsc::UnboundedSender<Bytes>>, body: Bytes) -> Bytes {
    let _ = tx.send(body.clone());
    body
}

/// Start an echo server on an OS-assigned port.
pub async fn start_echo_server() -> EchoServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    let app = Router::new()
        .route("/{*path}", any(echo))
        .layer(DefaultBodyLimit::disable())
        .with_state(tx);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    EchoServer { addr, received: rx }
}

/// Temp file filled with `PATTERN` repeated `repeats` times.
pub fn pattern_file(repeats: usize) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for _ in 0..repeats {
        file.write_all(PATTERN).unwrap();
    }
    file.flush().unwrap();
    file
}

/// Random payload of `len` bytes.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    (0..len).map(|_| rng.u8(..)).collect()
}

/// Drain every snapshot already delivered to a channel observer.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ProgressSnapshot>) -> Vec<ProgressSnapshot> {
    let mut events = Vec::new();
    while let Ok(snapshot) = rx.try_recv() {
        events.push(snapshot);
    }
    events
}

/// Decode a chunked body, panicking on malformed framing.
pub fn dechunk(mut wire: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    loop {
        let line_end = wire.windows(2).position(|w| w == b"\r\n").expect("chunk size line");
        let size = usize::from_str_radix(std::str::from_utf8(&wire[..line_end]).unwrap(), 16).unwrap();
        wire = &wire[line_end + 2..];
        if size == 0 {
            assert_eq!(wire, b"\r\n", "terminal chunk must end the body");
            return body;
        }
        body.extend_from_slice(&wire[..size]);
        assert_eq!(&wire[size..size + 2], b"\r\n");
        wire = &wire[size + 2..];
    }
}

/// Reader that yields the given pieces one read at a time.
pub struct ScriptedReader {
    pieces: VecDeque<Vec<u8>>,
}

impl ScriptedReader {
    pub fn new(sizes: &[usize]) -> Self {
        Self {
            pieces: sizes.iter().map(|n| vec![b'x'; *n]).collect(),
        }
    }
}

impl AsyncRead for ScriptedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if let Some(mut piece) = self.pieces.pop_front() {
            let n = piece.len().min(buf.remaining());
            buf.put_slice(&piece[..n]);
            if n < piece.len() {
                piece.drain(..n);
                self.pieces.push_front(piece);
            }
        }
        Poll::Ready(Ok(()))
    }
}

/// Reader that errors after producing `ok_bytes`.
pub struct FailingReader {
    ok_bytes: usize,
}

impl FailingReader {
    pub fn new(ok_bytes: usize) -> Self {
        Self { ok_bytes }
    }
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if self.ok_bytes == 0 {
            return Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "producer died",
            )));
        }
        let n = self.ok_bytes.min(buf.remaining());
        buf.put_slice(&vec![b'r'; n]);
        self.ok_bytes -= n;
        Poll::Ready(Ok(()))
    }
}

/// Transport that accepts `capacity` bytes, then fails every write.
pub struct FailingWriter {
    pub written: Vec<u8>,
    capacity: usize,
}

impl FailingWriter {
    pub fn new(capacity: usize) -> Self {
        Self {
            written: Vec::new(),
            capacity,
        }
    }
}

impl AsyncWrite for FailingWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        let room = self.capacity - self.written.len();
        if room == 0 {
            return Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "peer reset",
            )));
        }
        let n = room.min(buf.len());
        self.written.extend_from_slice(&buf[..n]);
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

//! End-to-end uploads against an echo server.

use http::StatusCode;
use tokio::sync::mpsc;

use progressive_upload::config::UploadConfig;
use progressive_upload::transfer::TransferState;
use progressive_upload::{BodySource, Framing, TransferRequest, Uploader};

mod common;

#[tokio::test]
async fn test_upload_progress() {
    let mut server = common::start_echo_server().await;

    let repeats = 1024 * 100 * 10 / common::PATTERN.len() + 1;
    let file = common::pattern_file(repeats);
    let expected_size = (common::PATTERN.len() * repeats) as u64;
    assert_eq!(std::fs::metadata(file.path()).unwrap().len(), expected_size);

    let source = BodySource::file(file.path()).await.unwrap();
    let request = TransferRequest::post(&server.url("/foo/test"), source).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let ack = Uploader::default().upload(request, tx).await.unwrap();

    assert_eq!(ack.status, StatusCode::OK);
    assert_eq!(ack.summary.bytes_sent, expected_size);
    assert_eq!(ack.summary.framing, Framing::LengthDelimited(expected_size));

    let events = common::drain(&mut rx);
    assert!(!events.is_empty());
    assert!(events.windows(2).all(|w| w[0].bytes_sent < w[1].bytes_sent));
    let last = events.last().unwrap();
    assert_eq!(last.bytes_sent, expected_size, "observer wasn't notified of all the bytes");
    assert_eq!(last.total_bytes, Some(expected_size));

    let received = server.received.recv().await.unwrap();
    assert_eq!(&received[..], &std::fs::read(file.path()).unwrap()[..]);
}

#[tokio::test]
async fn test_upload_stream_progress() {
    let mut server = common::start_echo_server().await;
    let payload = common::random_bytes(200_000);

    let request = TransferRequest::post(
        &server.url("/foo/test"),
        BodySource::stream(std::io::Cursor::new(payload.clone())),
    )
    .unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let ack = Uploader::default().upload(request, tx).await.unwrap();

    assert_eq!(ack.status, StatusCode::OK);
    assert_eq!(ack.summary.framing, Framing::Chunked);
    assert_eq!(ack.summary.total_bytes, None);

    let events = common::drain(&mut rx);
    assert!(events.iter().all(|s| s.total_bytes.is_none()));
    assert_eq!(events.last().unwrap().bytes_sent, payload.len() as u64);

    let received = server.received.recv().await.unwrap();
    assert_eq!(&received[..], &payload[..]);
}

#[tokio::test]
async fn test_upload_empty_body() {
    let mut server = common::start_echo_server().await;
    let request = TransferRequest::post(&server.url("/empty"), BodySource::bytes(Vec::new())).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let ack = Uploader::default().upload(request, tx).await.unwrap();

    assert_eq!(ack.status, StatusCode::OK);
    let events = common::drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].bytes_sent, 0);
    assert_eq!(events[0].total_bytes, Some(0));
    assert!(server.received.recv().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_small_write_size_from_config() {
    let server = common::start_echo_server().await;
    let mut config = UploadConfig::default();
    config.transfer.max_write_size = 1000;
    config.transfer.stream_chunk_size = 1000;

    let request = TransferRequest::post(&server.url("/foo/test"), BodySource::bytes(vec![5u8; 10_500])).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let pending = Uploader::new(config).start(request, tx);
    let mut states = pending.handle().state_receiver();

    let ack = pending.finish().await.unwrap();

    assert_eq!(ack.summary.writes, 11);
    assert_eq!(common::drain(&mut rx).len(), 11);
    assert_eq!(*states.borrow_and_update(), TransferState::Completed);
}

#[tokio::test]
async fn test_concurrent_uploads() {
    let server = common::start_echo_server().await;
    let uploader = Uploader::default();

    let mut tasks = Vec::new();
    for i in 1..=4usize {
        let request = TransferRequest::post(
            &server.url(&format!("/upload/{}", i)),
            BodySource::bytes(vec![i as u8; i * 50_000]),
        )
        .unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        tasks.push((i, uploader.start(request, tx), rx));
    }

    for (i, pending, mut rx) in tasks {
        let ack = pending.finish().await.unwrap();
        assert_eq!(ack.status, StatusCode::OK);
        assert_eq!(ack.summary.bytes_sent, (i * 50_000) as u64);

        let events = common::drain(&mut rx);
        assert!(events.windows(2).all(|w| w[0].bytes_sent < w[1].bytes_sent));
        assert_eq!(events.last().unwrap().bytes_sent, (i * 50_000) as u64);
    }
}

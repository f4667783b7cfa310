//! Upload client.
//!
//! # Responsibilities
//! - Connect to the request target with the configured deadline
//! - Run the transfer driver (head + body) on a spawned task
//! - Read the response head as acknowledgment once the body is sent
//! - Hand the caller a transfer handle for progress state and cancellation

use std::time::Duration;

use http::StatusCode;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::UploadConfig;
use crate::http::{encode_head, read_response_head, ResponseError, TransferRequest};
use crate::net;
use crate::transfer::{
    begin, CancelHandle, DriverConfig, ProgressObserver, TransferDriver, TransferError,
    TransferHandle, TransferSummary,
};

/// Errors surfaced by an upload.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The body transfer failed (includes connect failures and cancellation).
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// The response head could not be read.
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// No response head arrived in time.
    #[error("no response within {0:?}")]
    ResponseTimeout(Duration),

    /// The upload task panicked or was aborted.
    #[error("upload task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result of a completed upload.
#[derive(Debug, Clone)]
pub struct Acknowledgment {
    pub status: StatusCode,
    pub summary: TransferSummary,
}

/// An upload running in the background.
#[derive(Debug)]
pub struct PendingUpload {
    handle: TransferHandle,
    task: JoinHandle<Result<Option<StatusCode>, ClientError>>,
}

impl PendingUpload {
    pub fn handle(&self) -> &TransferHandle {
        &self.handle
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.cancel_handle()
    }

    /// Wait for the body transfer and the response head.
    pub async fn finish(self) -> Result<Acknowledgment, ClientError> {
        let summary = self.handle.wait().await?;
        match self.task.await?? {
            Some(status) => Ok(Acknowledgment { status, summary }),
            None => Err(ClientError::Transfer(TransferError::Interrupted)),
        }
    }
}

/// Sends request bodies with progress reporting.
#[derive(Debug, Clone, Default)]
pub struct Uploader {
    config: UploadConfig,
}

impl Uploader {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Start an upload on the current Tokio runtime.
    pub fn start<O>(&self, request: TransferRequest, observer: O) -> PendingUpload
    where
        O: ProgressObserver + 'static,
    {
        let (handle, context) = begin();
        let driver_config = DriverConfig::from(&self.config.transfer);
        let connect_timeout = Duration::from_secs(self.config.timeouts.connect_secs);
        let response_timeout = Duration::from_secs(self.config.timeouts.response_secs);

        let (head, body) = request.into_parts();
        tracing::info!(
            transfer_id = %context.id(),
            method = %head.method,
            url = %head.url,
            framing = %head.framing,
            "Starting upload"
        );

        let task = tokio::spawn(async move {
            let mut connection = match net::connect(&head.url, connect_timeout).await {
                Ok(conn) => conn,
                Err(e) => {
                    context.abort(TransferError::Connect(e));
                    return Ok(None);
                }
            };
            let connection_id = connection.id();

            let driver = TransferDriver::new(
                context,
                body,
                connection.stream_mut(),
                observer,
                driver_config,
            )
            .with_head(encode_head(&head));
            let (stream, summary) = driver.run().await;
            if summary.is_none() {
                return Ok(None);
            }

            let response = tokio::time::timeout(response_timeout, read_response_head(stream))
                .await
                .map_err(|_| ClientError::ResponseTimeout(response_timeout))??;

            tracing::info!(
                connection_id = %connection_id,
                status = %response.status,
                "Upload acknowledged"
            );
            Ok(Some(response.status))
        });

        PendingUpload { handle, task }
    }

    /// Upload and wait for the acknowledgment.
    pub async fn upload<O>(&self, request: TransferRequest, observer: O) -> Result<Acknowledgment, ClientError>
    where
        O: ProgressObserver + 'static,
    {
        self.start(request, observer).finish().await
    }
}

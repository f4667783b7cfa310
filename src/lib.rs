//! Progressive HTTP upload library.
//!
//! Sends a request body over HTTP/1.1 with byte-level progress reporting and a
//! one-shot completion signal that fires exactly once per transfer.

pub mod body;
pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod transfer;

pub use body::{BodySource, Framing};
pub use client::{Acknowledgment, ClientError, Uploader};
pub use config::UploadConfig;
pub use crate::http::TransferRequest;
pub use transfer::{ProgressObserver, ProgressSnapshot, TransferError, TransferHandle, TransferSummary};

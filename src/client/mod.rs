//! Upload client subsystem.
//!
//! # Data Flow
//! ```text
//! Uploader::start(TransferRequest, observer)
//!     → request split into stamped head + BodySource
//!     → spawned task: net::connect → TransferDriver::run → read_response_head
//!     → PendingUpload { TransferHandle, task }
//!
//! PendingUpload::finish:
//!     → CompletionLatch (transfer outcome)
//!     → task result (response status)
//!     → Acknowledgment
//! ```
//!
//! # Design Decisions
//! - Connect failures resolve the latch like any other transfer failure
//! - The response is awaited only after a successful body transfer

pub mod upload;

pub use upload::{Acknowledgment, ClientError, PendingUpload, Uploader};

//! HTTP framing subsystem.
//!
//! # Data Flow
//! ```text
//! TransferRequest (method, URL, ordered headers, BodySource)
//!     → request.rs (defaults + framing header stamped)
//!     → head.rs (request line + headers serialized)
//!     → [transfer driver sends head, then body]
//!     → response.rs (status line + headers read as acknowledgment)
//! ```
//!
//! # Design Decisions
//! - HTTP/1.1 only; no redirects, auth or compression
//! - Header order preserved exactly as inserted
//! - Response body is never consumed

pub mod head;
pub mod request;
pub mod response;

pub use head::encode_head;
pub use request::{Headers, RequestError, RequestHead, TransferRequest};
pub use response::{read_response_head, ResponseError, ResponseHead};

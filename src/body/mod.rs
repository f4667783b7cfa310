//! Request body subsystem.
//!
//! # Data Flow
//! ```text
//! caller body (bytes / file region / AsyncRead)
//!     → source.rs (BodySource: known length + bounded pieces)
//!     → framing.rs (Framing::select on the known length)
//!     → headers stamped, driver told how to wrap each write
//! ```
//!
//! # Design Decisions
//! - Known length always means `Content-Length`; unknown always means chunked
//! - Fixed in-memory sources are sliced, never copied
//! - Short reads against a declared length fail the transfer

pub mod framing;
pub mod source;

pub use framing::Framing;
pub use source::{BodySource, FixedSource, StreamSource};

//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Request target (URL)
//!     → connection.rs (resolve, connect with deadline, TCP_NODELAY)
//!     → Hand off to the transfer driver (writes) and response reader (reads)
//! ```
//!
//! # Design Decisions
//! - Plain TCP only; TLS is out of scope
//! - One connection per transfer, never shared between transfers

pub mod connection;

pub use connection::{connect, Connection, ConnectionId};

//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT → CancelHandle::cancel → driver enters Failed(Cancelled)
//! ```

pub mod signals;

pub use signals::cancel_on_ctrl_c;

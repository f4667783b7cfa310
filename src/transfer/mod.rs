//! Progressive transfer engine.
//!
//! # Data Flow
//! ```text
//! handle::begin() → (TransferHandle for the caller, TransferContext for the driver)
//!
//! TransferDriver::run (driver.rs):
//!     Idle → Sending: head written
//!     loop: BodySource::next_chunk → framed write → flush
//!         → ProgressTracker::on_bytes_written (progress.rs) → observer
//!     source done → terminal marker → ProgressTracker::finish
//!     → Completed | Failed → CompletionLatch released (latch.rs)
//! ```
//!
//! # Design Decisions
//! - Strictly sequential writes per transfer; ordering needs no locking
//! - The latch is the single place a failure surfaces
//! - Progress already reported is never retracted

pub mod driver;
pub mod error;
pub mod handle;
pub mod latch;
pub mod progress;

pub use driver::{DriverConfig, TransferDriver};
pub use error::TransferError;
pub use handle::{begin, CancelHandle, TransferContext, TransferHandle, TransferId, TransferState};
pub use latch::{completion_latch, CompletionLatch, LatchSignal, TransferOutcome};
pub use progress::{ProgressObserver, ProgressSnapshot, ProgressTracker, TransferSummary};

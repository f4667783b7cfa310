//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! transfer driver / uploader produce:
//!     → logging.rs (structured log events, span per transfer)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stderr/stdout log output
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Transfer ID flows through every log line of a transfer
//! - Per-chunk events only at trace level
//! - Metrics are cheap (no-ops until a recorder is installed)

pub mod logging;
pub mod metrics;

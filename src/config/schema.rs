//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the uploader.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for uploads.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct UploadConfig {
    /// Body transfer sizing and write deadlines.
    pub transfer: TransferConfig,

    /// Connection and response timeouts.
    pub timeouts: TimeoutConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Transfer sizing.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransferConfig {
    /// Maximum body bytes submitted in a single write.
    pub max_write_size: usize,

    /// Read size for stream sources of unknown length.
    pub stream_chunk_size: usize,

    /// Deadline for a single write in seconds (0 disables).
    pub write_timeout_secs: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_write_size: 64 * 1024,
            stream_chunk_size: 8 * 1024,
            write_timeout_secs: 30,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the response head after the body is sent, in seconds.
    pub response_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            response_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (overridden by `RUST_LOG`).
    pub log_filter: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "progressive_upload=info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

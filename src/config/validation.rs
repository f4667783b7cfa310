//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sizes > 0, timeouts > 0)
//! - Check cross-field constraints (stream chunk size within write size)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: UploadConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::UploadConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration.
pub fn validate_config(config: &UploadConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let transfer = &config.transfer;

    if transfer.max_write_size == 0 {
        errors.push(ValidationError::new("transfer.max_write_size", "must be greater than 0"));
    }
    if transfer.stream_chunk_size == 0 {
        errors.push(ValidationError::new("transfer.stream_chunk_size", "must be greater than 0"));
    } else if transfer.stream_chunk_size > transfer.max_write_size {
        errors.push(ValidationError::new(
            "transfer.stream_chunk_size",
            format!(
                "{} exceeds max_write_size {}",
                transfer.stream_chunk_size, transfer.max_write_size
            ),
        ));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }
    if config.timeouts.response_secs == 0 {
        errors.push(ValidationError::new("timeouts.response_secs", "must be greater than 0"));
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! # Error Types — Core Failure Modes
//!
//! Errors shared across the WRC Stack. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations. Protocol-level
//! rejections (pledge exclusivity, proof replay, escrow preconditions)
//! live in the crates that own those state machines; this module covers
//! the foundational concerns: canonicalization and input validation.

use thiserror::Error;

/// Top-level error type for foundational operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Canonical serialization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// An identifier or value failed construction-time validation.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Amounts and round numbers must be strings or integers.
    #[error("float values are not permitted in canonical representations; use string or integer: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

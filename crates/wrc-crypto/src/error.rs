//! Errors in cryptographic operations.

use thiserror::Error;

/// Error in cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key generation or parsing failed.
    #[error("key error: {0}")]
    KeyError(String),

    /// The message could not be canonicalized for signing.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] wrc_core::CanonicalizationError),
}

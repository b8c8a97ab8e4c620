//! Error types for the cipher engine.

use thiserror::Error;

/// Errors that can occur during stream encryption or decryption.
#[derive(Debug, Error)]
pub enum CipherError {
    /// Encryption error.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Authentication failure or malformed envelope. Fatal to the current
    /// operation; retrying with the same ciphertext cannot succeed.
    #[error("decryption failure: {0}")]
    Decryption(String),

    /// The stream exceeded the maximum frame count for one IV.
    #[error("stream exceeds maximum frame count")]
    StreamTooLong,

    /// Underlying IO failure, propagated unchanged.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CipherError {
    /// True when the failure is an authentication/envelope problem rather
    /// than an IO fault.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, CipherError::Decryption(_))
    }
}

/// Result type for cipher operations.
pub type Result<T> = std::result::Result<T, CipherError>;

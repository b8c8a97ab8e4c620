//! Error types for DocVault core primitives.

use thiserror::Error;

/// Errors from key material handling.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("key is not valid hex")]
    InvalidKeyEncoding,

    #[error("key must be exactly {expected} bytes")]
    InvalidKeyLength { expected: usize },
}

/// Errors from configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported cipher algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("cipher key: {0}")]
    CipherKey(#[from] CoreError),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("token and URL secrets must differ")]
    SharedSecret,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

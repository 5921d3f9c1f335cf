//! Error types for the cryptography layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A key could not be parsed or encoded.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A signature could not be decoded.
    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    /// Signature verification failed.
    #[error("signature verification failed")]
    VerificationFailed,

    /// Sealing (encryption) failed.
    #[error("sealing failed: {0}")]
    Sealing(String),

    /// Unsealing failed (wrong key or tampered data).
    #[error("unsealing failed: {0}")]
    Unsealing(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

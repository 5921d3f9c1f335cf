//! Core type definitions for TokenGate.
//!
//! This crate defines the fundamental types shared across the engine:
//! - Token and device identifiers
//! - Unix-second timestamps with "never expires" semantics
//!
//! Domain logic (tokens, ledgers, verification) lives in `tokengate-engine`;
//! nothing here depends on cryptography.

mod ids;
mod timestamp;

pub use ids::{DeviceId, TokenId};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}

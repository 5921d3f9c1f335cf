//! Error types for the engine.
//!
//! Binding layers translate [`EngineError`] into their native idiom through
//! [`ErrorKind`], whose ordinals are stable across every SDK surface.

use thiserror::Error;
use tokengate_crypto::CryptoError;

/// Stable error taxonomy shared with the binding layers.
///
/// The ordinals are part of the external contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorKind {
    Success = 0,
    InvalidArgument = 1,
    NotInitialized = 2,
    AlreadyInitialized = 3,
    Network = 4,
    Crypto = 5,
    Unknown = 6,
}

impl ErrorKind {
    /// Returns the stable ordinal for this kind.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors produced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed configuration or payload.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation was called before `initialize`.
    #[error("client not initialized")]
    NotInitialized,

    /// `initialize` was called twice without an intervening shutdown.
    #[error("client already initialized")]
    AlreadyInitialized,

    /// An operation requires an activated token.
    #[error("license not activated")]
    NotActivated,

    /// An operation requires an imported token.
    #[error("no token imported")]
    NoToken,

    /// A token or envelope failed schema validation.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// A sealed export exceeds the transfer size limit.
    #[error("exported token too large: {size} bytes (limit {limit})")]
    ExportTooLarge { size: usize, limit: usize },

    /// A persisted snapshot is newer than the state being written.
    #[error("stale state: on-disk state_index {on_disk} is ahead of {ours}")]
    StaleState { on_disk: u64, ours: u64 },

    /// Collaborator network failure, surfaced verbatim.
    #[error("network error: {0}")]
    Network(String),

    /// Signature, verification, or sealing failure.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Persistent storage failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Maps this error onto the stable binding-layer taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_)
            | Self::NotActivated
            | Self::NoToken
            | Self::MalformedToken(_)
            | Self::ExportTooLarge { .. }
            | Self::StaleState { .. }
            | Self::Serialization(_) => ErrorKind::InvalidArgument,
            Self::NotInitialized => ErrorKind::NotInitialized,
            Self::AlreadyInitialized => ErrorKind::AlreadyInitialized,
            Self::Network(_) => ErrorKind::Network,
            Self::Crypto(_) => ErrorKind::Crypto,
            Self::Storage(_) => ErrorKind::Unknown,
        }
    }
}

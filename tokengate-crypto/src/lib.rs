//! Cryptographic primitives for TokenGate.
//!
//! This crate wraps the external cryptography libraries behind small,
//! domain-neutral types:
//! - Ed25519 signing and verification with PEM and base64 transport
//! - SHA-256 hashing
//! - ChaCha20-Poly1305 sealed blobs for token transfer
//!
//! Nothing in here knows about tokens, ledgers, or trust chains; that
//! layering lives in `tokengate-engine`.

mod error;
mod hash;
mod seal;
mod signing;

pub use error::{CryptoError, CryptoResult};
pub use hash::{sha256, sha256_hex};
pub use seal::{open, open_string, seal, seal_string, SealKey, SealedBlob, NONCE_SIZE, TAG_SIZE};
pub use signing::{KeyPair, Signature, SigningKey, VerifyingKey};

//! Sealed blobs using ChaCha20-Poly1305.
//!
//! A sealed blob carries its nonce alongside the ciphertext and encodes as
//! `base64(nonce || ciphertext)` for text transport. The seal key is derived
//! as the SHA-256 of caller-supplied key material, so both sides of a token
//! hand-off derive the same key from the same product key file.

use crate::error::{CryptoError, CryptoResult};
use crate::hash::sha256;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// A symmetric seal key with automatic zeroization on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SealKey {
    bytes: [u8; 32],
}

impl SealKey {
    /// Derives a seal key from arbitrary key material via SHA-256.
    #[must_use]
    pub fn derive(material: &[u8]) -> Self {
        Self {
            bytes: sha256(material),
        }
    }

    /// Creates a seal key from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl std::fmt::Debug for SealKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Sealed data with the metadata needed to open it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SealedBlob {
    /// The nonce used for sealing (unique per seal).
    pub nonce: [u8; NONCE_SIZE],
    /// The ciphertext (includes auth tag).
    pub ciphertext: Vec<u8>,
}

impl SealedBlob {
    /// Encodes to base64 for storage/transmission.
    #[must_use]
    pub fn to_base64(&self) -> String {
        let mut bytes = Vec::with_capacity(NONCE_SIZE + self.ciphertext.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        BASE64.encode(&bytes)
    }

    /// Decodes from base64.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| CryptoError::Unsealing(format!("invalid base64: {e}")))?;

        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::Unsealing("data too short".to_string()));
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[..NONCE_SIZE]);
        let ciphertext = bytes[NONCE_SIZE..].to_vec();

        Ok(Self { nonce, ciphertext })
    }
}

/// Seals plaintext under the given key.
pub fn seal(key: &SealKey, plaintext: &[u8]) -> CryptoResult<SealedBlob> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::Sealing(e.to_string()))?;

    Ok(SealedBlob {
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Opens a sealed blob with the given key.
pub fn open(key: &SealKey, sealed: &SealedBlob) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = Nonce::from_slice(&sealed.nonce);

    cipher
        .decrypt(nonce, sealed.ciphertext.as_ref())
        .map_err(|_| CryptoError::Unsealing("wrong key or tampered data".to_string()))
}

/// Seals a string and returns the base64-encoded blob.
pub fn seal_string(key: &SealKey, plaintext: &str) -> CryptoResult<String> {
    Ok(seal(key, plaintext.as_bytes())?.to_base64())
}

/// Opens a base64-encoded blob and returns the plaintext string.
pub fn open_string(key: &SealKey, encoded: &str) -> CryptoResult<String> {
    let sealed = SealedBlob::from_base64(encoded)?;
    let plaintext = open(key, &sealed)?;
    String::from_utf8(plaintext).map_err(|e| CryptoError::Unsealing(format!("invalid UTF-8: {e}")))
}

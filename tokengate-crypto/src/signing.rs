//! Ed25519 signing and verification.
//!
//! Keys travel as PKCS#8 / SPKI PEM text (matching the issuer toolchain);
//! signatures travel as standard base64.

use crate::error::{CryptoError, CryptoResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{
    DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey,
};
use ed25519_dalek::{
    Signer as _, Verifier as _, Signature as DalekSignature, SigningKey as DalekSigningKey,
    VerifyingKey as DalekVerifyingKey,
};
use rand::rngs::OsRng;

/// Ed25519 signing key (secret).
pub struct SigningKey(DalekSigningKey);

/// Ed25519 verifying key (public).
#[derive(Clone, PartialEq, Eq)]
pub struct VerifyingKey(DalekVerifyingKey);

/// Ed25519 signature.
#[derive(Clone)]
pub struct Signature(DalekSignature);

/// A keypair for signing and verification.
pub struct KeyPair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generates a new random Ed25519 keypair.
    #[must_use]
    pub fn generate() -> Self {
        let signing = DalekSigningKey::generate(&mut OsRng);
        let verifying = signing.verifying_key();
        Self {
            signing_key: SigningKey(signing),
            verifying_key: VerifyingKey(verifying),
        }
    }
}

impl SigningKey {
    /// Creates a signing key from a raw 32-byte secret.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(DalekSigningKey::from_bytes(bytes))
    }

    /// Parses a signing key from PKCS#8 PEM text.
    pub fn from_pkcs8_pem(pem: &str) -> CryptoResult<Self> {
        DalekSigningKey::from_pkcs8_pem(pem)
            .map(Self)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid private key PEM: {e}")))
    }

    /// Encodes the signing key as PKCS#8 PEM text.
    pub fn to_pkcs8_pem(&self) -> CryptoResult<String> {
        self.0
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| CryptoError::InvalidKey(format!("private key PEM encoding: {e}")))
    }

    /// Signs a message and returns the signature.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message))
    }

    /// Returns the corresponding verifying key.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(self.0.verifying_key())
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl VerifyingKey {
    /// Creates a verifying key from a raw 32-byte public key.
    pub fn from_bytes(bytes: &[u8; 32]) -> CryptoResult<Self> {
        DalekVerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid public key bytes: {e}")))
    }

    /// Parses a verifying key from SPKI PEM text.
    pub fn from_public_key_pem(pem: &str) -> CryptoResult<Self> {
        DalekVerifyingKey::from_public_key_pem(pem)
            .map(Self)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid public key PEM: {e}")))
    }

    /// Encodes the verifying key as SPKI PEM text.
    pub fn to_public_key_pem(&self) -> CryptoResult<String> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidKey(format!("public key PEM encoding: {e}")))
    }

    /// Returns the raw 32-byte public key.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Verifies a signature against a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> CryptoResult<()> {
        self.0
            .verify(message, &signature.0)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl std::fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyingKey")
            .field("public", &BASE64.encode(self.0.to_bytes()))
            .finish()
    }
}

impl Signature {
    /// Creates a signature from a raw 64-byte value.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self(DalekSignature::from_bytes(bytes))
    }

    /// Returns the raw 64-byte signature.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }

    /// Encodes the signature as base64.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0.to_bytes())
    }

    /// Decodes a signature from base64.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidSignature(format!("invalid base64: {e}")))?;
        let array: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignature("wrong signature length".to_string()))?;
        Ok(Self::from_bytes(&array))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let kp = KeyPair::generate();
        let msg = b"hello world";
        let sig = kp.signing_key.sign(msg);
        assert!(kp.verifying_key.verify(msg, &sig).is_ok());
    }

    #[test]
    fn wrong_message_fails() {
        let kp = KeyPair::generate();
        let sig = kp.signing_key.sign(b"correct");
        assert!(kp.verifying_key.verify(b"wrong", &sig).is_err());
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let sig = kp1.signing_key.sign(b"message");
        assert!(kp2.verifying_key.verify(b"message", &sig).is_err());
    }

    #[test]
    fn pem_roundtrip_private() {
        let kp = KeyPair::generate();
        let pem = kp.signing_key.to_pkcs8_pem().unwrap();
        assert!(pem.contains("BEGIN PRIVATE KEY"));

        let restored = SigningKey::from_pkcs8_pem(&pem).unwrap();
        let sig = restored.sign(b"test");
        assert!(kp.verifying_key.verify(b"test", &sig).is_ok());
    }

    #[test]
    fn pem_roundtrip_public() {
        let kp = KeyPair::generate();
        let pem = kp.verifying_key.to_public_key_pem().unwrap();
        assert!(pem.contains("BEGIN PUBLIC KEY"));

        let restored = VerifyingKey::from_public_key_pem(&pem).unwrap();
        let sig = kp.signing_key.sign(b"test");
        assert!(restored.verify(b"test", &sig).is_ok());
    }

    #[test]
    fn pem_garbage_rejected() {
        assert!(SigningKey::from_pkcs8_pem("not a pem").is_err());
        assert!(VerifyingKey::from_public_key_pem("not a pem").is_err());
    }

    #[test]
    fn signature_base64_roundtrip() {
        let kp = KeyPair::generate();
        let sig = kp.signing_key.sign(b"data");
        let encoded = sig.to_base64();
        let restored = Signature::from_base64(&encoded).unwrap();
        assert!(kp.verifying_key.verify(b"data", &restored).is_ok());
    }

    #[test]
    fn signature_bad_base64_rejected() {
        assert!(Signature::from_base64("!!!").is_err());
        assert!(Signature::from_base64("AAAA").is_err()); // wrong length
    }
}

//! Sealed import/export of tokens.
//!
//! An export is a small JSON envelope `{v, mode, blob}` where `blob` is the
//! token JSON sealed under the product-key-derived seal key. The mode label
//! distinguishes activation hand-offs from state-change hand-offs but does
//! not change the structure. Import accepts either an envelope or plain
//! token JSON and performs schema validation before any trust-chain work.

use serde::{Deserialize, Serialize};
use tokengate_crypto::{open_string, seal_string, SealKey};

use crate::error::{EngineError, EngineResult};
use crate::token::LicenseToken;

/// Maximum size in bytes of a sealed export.
pub const MAX_EXPORT_BYTES: usize = 65536;

/// What kind of hand-off an export represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportMode {
    /// Exported right after activation, for restoring or transferring.
    Activated,
    /// Exported after usage recording, carrying new ledger entries.
    StateChanged,
}

impl std::fmt::Display for ExportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Activated => f.write_str("activated"),
            Self::StateChanged => f.write_str("state_changed"),
        }
    }
}

/// The sealed-export envelope.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    /// Envelope format version.
    v: u32,
    /// Hand-off label.
    mode: ExportMode,
    /// Sealed token JSON, base64(nonce || ciphertext).
    blob: String,
}

const ENVELOPE_VERSION: u32 = 1;

/// Seals and unseals tokens for transfer between devices.
pub struct TokenCodec {
    seal_key: SealKey,
}

impl TokenCodec {
    /// Creates a codec keyed off the product public key material.
    ///
    /// Both ends of a hand-off hold the same product key file, so both
    /// derive the same seal key.
    #[must_use]
    pub fn new(product_key_material: &str) -> Self {
        Self {
            seal_key: SealKey::derive(product_key_material.trim().as_bytes()),
        }
    }

    /// Serializes and seals a token.
    pub fn export(&self, token: &LicenseToken, mode: ExportMode) -> EngineResult<String> {
        let token_json = serde_json::to_string(token)?;
        let blob = seal_string(&self.seal_key, &token_json)?;
        let envelope = Envelope {
            v: ENVELOPE_VERSION,
            mode,
            blob,
        };
        let out = serde_json::to_string(&envelope)?;
        if out.len() > MAX_EXPORT_BYTES {
            return Err(EngineError::ExportTooLarge {
                size: out.len(),
                limit: MAX_EXPORT_BYTES,
            });
        }
        Ok(out)
    }

    /// Unseals and deserializes a token.
    ///
    /// Accepts either a sealed envelope or plain token JSON; in both cases
    /// the decoded structure is schema-validated before being returned.
    pub fn import(&self, text: &str) -> EngineResult<LicenseToken> {
        let text = text.trim();
        let token_json = match serde_json::from_str::<Envelope>(text) {
            Ok(envelope) => {
                if envelope.v != ENVELOPE_VERSION {
                    return Err(EngineError::MalformedToken(format!(
                        "unsupported envelope version {}",
                        envelope.v
                    )));
                }
                open_string(&self.seal_key, &envelope.blob)?
            }
            Err(_) => text.to_string(),
        };

        let token: LicenseToken = serde_json::from_str(&token_json)
            .map_err(|e| EngineError::MalformedToken(e.to_string()))?;
        token
            .validate_schema()
            .map_err(EngineError::MalformedToken)?;
        Ok(token)
    }
}

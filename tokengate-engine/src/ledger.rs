//! The append-only, hash-chained usage ledger.
//!
//! Every accepted usage record extends the chain by exactly one entry and
//! increments the token's `state_index` by exactly one. Appends are
//! all-or-nothing: a failed signature leaves both the chain and the index
//! untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tokengate_crypto::{sha256_hex, Signature, SigningKey, VerifyingKey};
use tokengate_types::Timestamp;

use crate::error::{EngineError, EngineResult};
use crate::token::{LicenseToken, UsageChainEntry};

/// A parsed usage-recording request.
///
/// The wire payload is strict JSON: an `action` tag plus a flat string map
/// of business parameters. Unknown fields are rejected at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsageRequest {
    /// Operation tag, free-form.
    pub action: String,
    /// Business payload; sorted map for deterministic serialization.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl UsageRequest {
    /// Parses a request from its JSON wire form.
    pub fn from_json(payload: &str) -> EngineResult<Self> {
        let request: Self = serde_json::from_str(payload)
            .map_err(|e| EngineError::InvalidArgument(format!("usage payload: {e}")))?;
        if request.action.is_empty() {
            return Err(EngineError::InvalidArgument(
                "usage payload: empty action".to_string(),
            ));
        }
        Ok(request)
    }
}

/// A chain-integrity failure, pinpointing the first offending entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("usage chain broken at seq {seq}: {reason}")]
pub struct ChainError {
    /// Sequence number of the first entry that fails verification.
    pub seq: u64,
    /// What failed at that entry.
    pub reason: String,
}

/// Appends to and verifies a token's usage chain.
#[derive(Debug, Default)]
pub struct UsageLedger;

impl UsageLedger {
    /// Appends one usage entry to the token and increments `state_index`.
    ///
    /// `hash_prev` is the hex digest of the last entry's canonical JSON, or
    /// of the token's base state when the chain is empty. The entry is
    /// signed with the device key before anything is mutated, so a signing
    /// failure leaves the token unchanged.
    pub fn append(
        token: &mut LicenseToken,
        device_key: &SigningKey,
        request: &UsageRequest,
    ) -> EngineResult<UsageChainEntry> {
        let hash_prev = match token.usage_chain.last() {
            Some(last) => sha256_hex(last.canonical_json().as_bytes()),
            None => token.base_state_digest(),
        };

        let mut entry = UsageChainEntry {
            seq: token.state_index,
            time: Timestamp::now().as_secs(),
            action: request.action.clone(),
            params: request.params.clone(),
            hash_prev,
            signature: String::new(),
        };
        entry.signature = device_key.sign(entry.signing_payload().as_bytes()).to_base64();

        token.usage_chain.push(entry.clone());
        token.state_index += 1;
        Ok(entry)
    }

    /// Verifies the full usage chain: hash continuity, sequence continuity,
    /// and every entry signature. Reports the first offending sequence
    /// number on failure.
    pub fn verify_chain(token: &LicenseToken) -> Result<(), ChainError> {
        if token.state_index != token.usage_chain.len() as u64 {
            return Err(ChainError {
                seq: token.usage_chain.len() as u64,
                reason: format!(
                    "state_index {} does not match chain length {}",
                    token.state_index,
                    token.usage_chain.len()
                ),
            });
        }

        if token.usage_chain.is_empty() {
            return Ok(());
        }

        let binding = token.device_binding.as_ref().ok_or_else(|| ChainError {
            seq: 0,
            reason: "usage chain present but token has no device binding".to_string(),
        })?;
        let device_key =
            VerifyingKey::from_public_key_pem(&binding.public_key).map_err(|e| ChainError {
                seq: 0,
                reason: format!("device public key unusable: {e}"),
            })?;

        let mut expected_prev = token.base_state_digest();
        for (i, entry) in token.usage_chain.iter().enumerate() {
            let seq = i as u64;
            if entry.seq != seq {
                return Err(ChainError {
                    seq,
                    reason: format!("expected seq {seq}, found {}", entry.seq),
                });
            }
            if entry.hash_prev != expected_prev {
                return Err(ChainError {
                    seq,
                    reason: "hash_prev does not match previous entry".to_string(),
                });
            }
            let signature = Signature::from_base64(&entry.signature).map_err(|e| ChainError {
                seq,
                reason: format!("signature undecodable: {e}"),
            })?;
            device_key
                .verify(entry.signing_payload().as_bytes(), &signature)
                .map_err(|_| ChainError {
                    seq,
                    reason: "entry signature does not verify".to_string(),
                })?;
            expected_prev = sha256_hex(entry.canonical_json().as_bytes());
        }

        Ok(())
    }
}

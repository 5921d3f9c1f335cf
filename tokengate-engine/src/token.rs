//! The license token and its usage chain entries.
//!
//! A token is issued externally, imported into a client session, bound once
//! to a device, and from then on mutated only by appending usage entries.
//! Two serializations matter here:
//!
//! - the *signing payload*, a pipe-joined string covering exactly the fields
//!   a signature attests (stable across reserialization), and
//! - the *canonical JSON*, used for hash-chaining, where determinism comes
//!   from fixed struct field order and sorted `BTreeMap` params.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokengate_crypto::sha256_hex;
use tokengate_types::{DeviceId, Timestamp, TokenId};

/// Signature algorithm tag carried by a token.
///
/// The engine verifies Ed25519 tokens; the other tags exist so that a
/// mismatch can be reported by name rather than as a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    #[serde(rename = "RSA")]
    Rsa,
    #[serde(rename = "Ed25519")]
    Ed25519,
    #[serde(rename = "SM2")]
    Sm2,
}

impl SignatureAlgorithm {
    /// Returns the wire name of the algorithm.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::Ed25519 => "Ed25519",
            Self::Sm2 => "SM2",
        }
    }
}

impl std::fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The device binding written at first activation.
///
/// `signature` is the license key's signature over
/// `device_id|public_key_pem|token_id`, so possession of the license private
/// key at activation time is what authorizes the binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceBinding {
    /// The bound device's fingerprint.
    pub device_id: DeviceId,
    /// The bound device's signing public key (SPKI PEM).
    pub public_key: String,
    /// License-key signature over the binding payload (base64).
    pub signature: String,
}

impl DeviceBinding {
    /// Returns the byte payload the binding signature covers.
    #[must_use]
    pub fn signing_payload(device_id: &DeviceId, public_key_pem: &str, token_id: &TokenId) -> String {
        format!("{}|{}|{}", device_id, public_key_pem.trim(), token_id)
    }
}

/// One accounting record in a token's usage chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageChainEntry {
    /// Equals the token's `state_index` at the time of append.
    pub seq: u64,
    /// Unix-second timestamp of recording.
    pub time: i64,
    /// Caller-supplied operation tag.
    pub action: String,
    /// Caller-supplied business payload; sorted for determinism.
    pub params: BTreeMap<String, String>,
    /// Hex SHA-256 of the previous entry's canonical JSON, or of the
    /// token's base-state digest for the first entry.
    pub hash_prev: String,
    /// Device-key signature over the signing payload (base64).
    pub signature: String,
}

impl UsageChainEntry {
    /// Returns the byte payload the entry signature covers:
    /// `seq|time|action|params_json|hash_prev`.
    #[must_use]
    pub fn signing_payload(&self) -> String {
        let params_json =
            serde_json::to_string(&self.params).expect("BTreeMap<String, String> serializes");
        format!(
            "{}|{}|{}|{}|{}",
            self.seq, self.time, self.action, params_json, self.hash_prev
        )
    }

    /// Returns the canonical JSON of the full entry (including signature),
    /// which the next entry's `hash_prev` is computed over.
    #[must_use]
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(self).expect("entry serializes")
    }
}

/// Base-state fields hashed into the first usage entry's `hash_prev`.
///
/// Restricted to fields that survive export/import unchanged, so a chain
/// verifies identically after a hand-off.
#[derive(Serialize)]
struct BaseState<'a> {
    token_id: &'a TokenId,
    license_code: &'a str,
    app_id: &'a str,
    holder_device_id: &'a Option<DeviceId>,
    issue_time: Timestamp,
    expire_time: Timestamp,
    alg: SignatureAlgorithm,
}

/// A license token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseToken {
    /// Unique identifier, immutable once issued.
    pub token_id: TokenId,
    /// Human-assigned license identifier, immutable.
    pub license_code: String,
    /// Identifies the licensed product, immutable.
    pub app_id: String,
    /// Device bound at first activation; never silently rebound.
    #[serde(default)]
    pub holder_device_id: Option<DeviceId>,
    /// Unix-second issue timestamp.
    pub issue_time: Timestamp,
    /// Unix-second expiry; zero means never expires.
    pub expire_time: Timestamp,
    /// Signature algorithm tag.
    pub alg: SignatureAlgorithm,
    /// Per-license public key embedded in the token (SPKI PEM).
    pub license_public_key: String,
    /// Product/root key signature over the license public key (base64).
    pub root_signature: String,
    /// License private key, sealed under the product-key-derived seal key.
    pub sealed_license_private_key: String,
    /// License-key signature over the static fields (base64).
    pub signature: String,
    /// Count of committed usage entries; starts at 0 at issuance.
    #[serde(default)]
    pub state_index: u64,
    /// Append-only usage ledger.
    #[serde(default)]
    pub usage_chain: Vec<UsageChainEntry>,
    /// Binding written at first activation.
    #[serde(default)]
    pub device_binding: Option<DeviceBinding>,
}

impl LicenseToken {
    /// Returns the byte payload the token signature covers:
    /// `token_id|app_id|license_code|issue_time|expire_time|alg`.
    ///
    /// The holder device is excluded: it is bound after issuance and must
    /// not invalidate the issuer's signature.
    #[must_use]
    pub fn signing_payload(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.token_id,
            self.app_id,
            self.license_code,
            self.issue_time,
            self.expire_time,
            self.alg
        )
    }

    /// Returns the hex digest of the post-activation base state, used as
    /// `hash_prev` for the first usage entry.
    #[must_use]
    pub fn base_state_digest(&self) -> String {
        let base = BaseState {
            token_id: &self.token_id,
            license_code: &self.license_code,
            app_id: &self.app_id,
            holder_device_id: &self.holder_device_id,
            issue_time: self.issue_time,
            expire_time: self.expire_time,
            alg: self.alg,
        };
        let json = serde_json::to_string(&base).expect("base state serializes");
        sha256_hex(json.as_bytes())
    }

    /// Returns true if the token has an expiry and it lies in the past.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expire_time.is_past()
    }

    /// Returns true if the token never expires.
    #[must_use]
    pub fn never_expires(&self) -> bool {
        self.expire_time.is_never()
    }

    /// Returns true if the token has been bound to a device.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.holder_device_id.is_some()
    }

    /// Validates structural well-formedness, independent of any signature.
    ///
    /// Used at import time, before any trust-chain work.
    pub fn validate_schema(&self) -> Result<(), String> {
        if self.license_code.is_empty() {
            return Err("missing license_code".to_string());
        }
        if self.app_id.is_empty() {
            return Err("missing app_id".to_string());
        }
        if self.signature.is_empty() {
            return Err("missing signature".to_string());
        }
        if self.license_public_key.is_empty() {
            return Err("missing license_public_key".to_string());
        }
        if let Some(binding) = &self.device_binding {
            if binding.device_id.is_empty() {
                return Err("device_binding missing device_id".to_string());
            }
            if binding.public_key.is_empty() {
                return Err("device_binding missing public_key".to_string());
            }
        }
        Ok(())
    }
}

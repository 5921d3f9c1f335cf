//! Trust-chain verification.
//!
//! The chain runs product (root) key → embedded license public key → token
//! signature, with an optional fourth link covering the device binding.
//! Checks run in a fixed order and short-circuit on the first failure, so
//! an algorithm mismatch is reported before any signature work happens.

use thiserror::Error;
use tokengate_crypto::{Signature, VerifyingKey};

use crate::token::{DeviceBinding, LicenseToken, SignatureAlgorithm};

/// Outcome of a verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    /// True when every applicable trust-chain step passed.
    pub valid: bool,
    /// Human-readable explanation; empty on success unless noted.
    pub message: String,
}

impl VerificationOutcome {
    /// A passing outcome with the given message.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: message.into(),
        }
    }

    /// A failing outcome with the given reason.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Typed trust-chain failure, one variant per verification step.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The token's algorithm tag does not match the expected algorithm.
    #[error("algorithm mismatch: token is {found}, expected {expected}")]
    AlgorithmMismatch {
        expected: SignatureAlgorithm,
        found: SignatureAlgorithm,
    },

    /// A field required by the chain is absent.
    #[error("missing trust chain field: {0}")]
    MissingChainField(&'static str),

    /// The root signature over the license public key did not verify.
    #[error("root signature invalid: {0}")]
    RootSignatureInvalid(String),

    /// The token's own signature did not verify.
    #[error("token signature invalid: {0}")]
    TokenSignatureInvalid(String),

    /// The device binding is absent, inconsistent, or fails verification.
    #[error("device binding invalid: {0}")]
    DeviceBindingInvalid(String),
}

/// Validates the signature chain of a token.
#[derive(Debug, Default)]
pub struct TrustChainVerifier;

impl TrustChainVerifier {
    /// Creates a verifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Runs the trust-chain checks in order, short-circuiting on the first
    /// failure:
    ///
    /// 1. algorithm tag matches `expected_alg`
    /// 2. license public key and root signature are present
    /// 3. root signature over the license public key verifies against the
    ///    product key
    /// 4. token signature verifies against the license public key
    /// 5. if a holder device is recorded, the device binding verifies
    ///    against the license public key
    pub fn verify(
        &self,
        token: &LicenseToken,
        product_key: &VerifyingKey,
        expected_alg: SignatureAlgorithm,
    ) -> Result<VerificationOutcome, VerifyError> {
        if token.alg != expected_alg {
            return Err(VerifyError::AlgorithmMismatch {
                expected: expected_alg,
                found: token.alg,
            });
        }

        if token.license_public_key.trim().is_empty() {
            return Err(VerifyError::MissingChainField("license_public_key"));
        }
        if token.root_signature.trim().is_empty() {
            return Err(VerifyError::MissingChainField("root_signature"));
        }

        let root_sig = Signature::from_base64(&token.root_signature)
            .map_err(|e| VerifyError::RootSignatureInvalid(e.to_string()))?;
        product_key
            .verify(token.license_public_key.trim().as_bytes(), &root_sig)
            .map_err(|_| {
                VerifyError::RootSignatureInvalid(
                    "license public key is not signed by the product key".to_string(),
                )
            })?;

        let license_key = VerifyingKey::from_public_key_pem(&token.license_public_key)
            .map_err(|e| VerifyError::TokenSignatureInvalid(e.to_string()))?;
        let token_sig = Signature::from_base64(&token.signature)
            .map_err(|e| VerifyError::TokenSignatureInvalid(e.to_string()))?;
        license_key
            .verify(token.signing_payload().as_bytes(), &token_sig)
            .map_err(|_| {
                VerifyError::TokenSignatureInvalid(
                    "token signature does not match its static fields".to_string(),
                )
            })?;

        if let Some(holder) = &token.holder_device_id {
            let binding = token.device_binding.as_ref().ok_or_else(|| {
                VerifyError::DeviceBindingInvalid("holder set but no device binding".to_string())
            })?;
            if binding.device_id != *holder {
                return Err(VerifyError::DeviceBindingInvalid(format!(
                    "binding device {} does not match holder {}",
                    binding.device_id, holder
                )));
            }
            let binding_sig = Signature::from_base64(&binding.signature)
                .map_err(|e| VerifyError::DeviceBindingInvalid(e.to_string()))?;
            let payload =
                DeviceBinding::signing_payload(&binding.device_id, &binding.public_key, &token.token_id);
            license_key
                .verify(payload.as_bytes(), &binding_sig)
                .map_err(|_| {
                    VerifyError::DeviceBindingInvalid(
                        "binding signature does not verify against the license key".to_string(),
                    )
                })?;
        }

        Ok(VerificationOutcome::ok(""))
    }
}

//! Shared test fixtures: an issuer-side token builder.
//!
//! Token issuance lives outside the engine in production (dl-issuer
//! tooling); tests reconstruct just enough of it to produce well-formed
//! signed tokens.

#![allow(dead_code)]

use tokengate_crypto::{seal_string, KeyPair, SealKey, SigningKey, VerifyingKey};
use tokengate_engine::{
    DeviceBinding, ExportMode, LicenseToken, SignatureAlgorithm, TokenCodec,
};
use tokengate_types::{DeviceId, Timestamp, TokenId};

/// Issuer-side fixture holding the product (root) and license keypairs.
pub struct TestIssuer {
    root_sk: SigningKey,
    root_vk: VerifyingKey,
    license_sk: SigningKey,
    license_vk: VerifyingKey,
    product_pem: String,
}

impl TestIssuer {
    /// Creates an issuer with deterministic keys.
    pub fn new() -> Self {
        Self::with_seeds([11u8; 32], [22u8; 32])
    }

    /// Creates an issuer from explicit key seeds (for wrong-key tests).
    pub fn with_seeds(root_seed: [u8; 32], license_seed: [u8; 32]) -> Self {
        let root_sk = SigningKey::from_bytes(&root_seed);
        let root_vk = root_sk.verifying_key();
        let license_sk = SigningKey::from_bytes(&license_seed);
        let license_vk = license_sk.verifying_key();
        let product_pem = root_vk.to_public_key_pem().unwrap();
        Self {
            root_sk,
            root_vk,
            license_sk,
            license_vk,
            product_pem,
        }
    }

    /// The product public key PEM handed to `set_product_public_key`.
    pub fn product_public_key_pem(&self) -> &str {
        &self.product_pem
    }

    /// Issues a fresh, unbound token.
    pub fn issue(&self, license_code: &str, app_id: &str, expire: Timestamp) -> LicenseToken {
        let license_pub_pem = self.license_vk.to_public_key_pem().unwrap();
        let root_signature = self
            .root_sk
            .sign(license_pub_pem.trim().as_bytes())
            .to_base64();

        let seal_key = SealKey::derive(self.product_pem.trim().as_bytes());
        let sealed_license_private_key =
            seal_string(&seal_key, &self.license_sk.to_pkcs8_pem().unwrap()).unwrap();

        let mut token = LicenseToken {
            token_id: TokenId::new(),
            license_code: license_code.to_string(),
            app_id: app_id.to_string(),
            holder_device_id: None,
            issue_time: Timestamp::now(),
            expire_time: expire,
            alg: SignatureAlgorithm::Ed25519,
            license_public_key: license_pub_pem,
            root_signature,
            sealed_license_private_key,
            signature: String::new(),
            state_index: 0,
            usage_chain: Vec::new(),
            device_binding: None,
        };
        token.signature = self
            .license_sk
            .sign(token.signing_payload().as_bytes())
            .to_base64();
        token
    }

    /// Issues a token already bound to the given device keypair, as if a
    /// previous activation had happened.
    pub fn issue_bound(
        &self,
        license_code: &str,
        app_id: &str,
        device: &KeyPair,
        device_id: &DeviceId,
    ) -> LicenseToken {
        let mut token = self.issue(license_code, app_id, Timestamp::NEVER);
        let public_key_pem = device.verifying_key.to_public_key_pem().unwrap();
        let payload = DeviceBinding::signing_payload(device_id, &public_key_pem, &token.token_id);
        token.device_binding = Some(DeviceBinding {
            device_id: device_id.clone(),
            public_key: public_key_pem,
            signature: self.license_sk.sign(payload.as_bytes()).to_base64(),
        });
        token.holder_device_id = Some(device_id.clone());
        token
    }

    /// Seals a token the way an issuer or peer device would for hand-off.
    pub fn sealed(&self, token: &LicenseToken, mode: ExportMode) -> String {
        TokenCodec::new(&self.product_pem)
            .export(token, mode)
            .unwrap()
    }

    /// Re-signs a token's static fields after a test mutated them.
    pub fn resign(&self, token: &mut LicenseToken) {
        token.signature = self
            .license_sk
            .sign(token.signing_payload().as_bytes())
            .to_base64();
    }
}

/// Flips one byte inside a base64 string's decoded form.
pub fn flip_base64_byte(encoded: &str, index: usize) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine};
    let mut bytes = STANDARD.decode(encoded).unwrap();
    bytes[index] ^= 0x01;
    STANDARD.encode(bytes)
}

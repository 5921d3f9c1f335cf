//! The session facade the SDK bindings call.
//!
//! A [`LicenseClient`] owns one session's mutable state and composes the
//! verifier, ledger, codec, store, and device identity. It is an explicit
//! object handed to the caller (no process-wide singleton) and provides no
//! internal synchronization: callers needing parallel use of one license
//! serialize access externally.

use serde::Serialize;
use tracing::{debug, info, warn};

use tokengate_crypto::{open_string, KeyPair, SealKey, SigningKey, VerifyingKey};
use tokengate_types::DeviceId;

use crate::codec::{ExportMode, TokenCodec};
use crate::config::ClientConfig;
use crate::device::DeviceFingerprint;
use crate::error::{EngineError, EngineResult};
use crate::ledger::{UsageLedger, UsageRequest};
use crate::store::{DeviceKeyRecord, StateStore};
use crate::token::{DeviceBinding, LicenseToken, SignatureAlgorithm};
use crate::trust::{TrustChainVerifier, VerificationOutcome};

/// Lifecycle of a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Initialized,
    KeyConfigured,
    TokenImported,
    Activated,
}

/// Device identity and signing material held while activated.
struct DeviceCredentials {
    device_id: DeviceId,
    signing_key: SigningKey,
}

/// Snapshot of session state for status queries.
///
/// String fields are empty when no token is held, mirroring the wire shape
/// every binding exposes.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub has_token: bool,
    pub is_activated: bool,
    pub issue_time: i64,
    pub expire_time: i64,
    pub state_index: u64,
    pub token_id: String,
    pub holder_device_id: String,
    pub app_id: String,
    pub license_code: String,
}

/// A license client session.
pub struct LicenseClient {
    lifecycle: Lifecycle,
    config: Option<ClientConfig>,
    store: Option<StateStore>,
    product_key: Option<VerifyingKey>,
    product_key_material: Option<String>,
    codec: Option<TokenCodec>,
    token: Option<LicenseToken>,
    credentials: Option<DeviceCredentials>,
    device_id: Option<DeviceId>,
    verifier: TrustChainVerifier,
}

impl LicenseClient {
    /// Creates an uninitialized client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Uninitialized,
            config: None,
            store: None,
            product_key: None,
            product_key_material: None,
            codec: None,
            token: None,
            credentials: None,
            device_id: None,
            verifier: TrustChainVerifier::new(),
        }
    }

    /// Initializes the session with a validated configuration.
    ///
    /// # Errors
    ///
    /// `AlreadyInitialized` if called twice without an intervening
    /// `shutdown`; `InvalidArgument` on a bad configuration.
    pub fn initialize(&mut self, config: ClientConfig) -> EngineResult<()> {
        if self.lifecycle != Lifecycle::Uninitialized {
            return Err(EngineError::AlreadyInitialized);
        }
        let config = config.validated()?;

        self.store = Some(StateStore::new(config.state_dir.clone()));
        self.device_id = Some(DeviceFingerprint::generate().device_id());
        info!(license_code = %config.license_code, "client initialized");
        self.config = Some(config);
        self.lifecycle = Lifecycle::Initialized;
        Ok(())
    }

    /// Configures the product public key (the trust-chain root) from PEM
    /// text.
    ///
    /// # Errors
    ///
    /// `NotInitialized` before `initialize`; `Crypto` if the PEM does not
    /// parse as an Ed25519 public key.
    pub fn set_product_public_key(&mut self, pem: &str) -> EngineResult<()> {
        if self.lifecycle == Lifecycle::Uninitialized {
            return Err(EngineError::NotInitialized);
        }
        let key = VerifyingKey::from_public_key_pem(pem)?;
        self.product_key = Some(key);
        self.product_key_material = Some(pem.to_string());
        self.codec = Some(TokenCodec::new(pem));
        if self.lifecycle == Lifecycle::Initialized {
            self.lifecycle = Lifecycle::KeyConfigured;
        }
        debug!("product public key configured");
        Ok(())
    }

    /// Imports a token from a sealed export blob or plain token JSON.
    ///
    /// Performs structural validation only; trust-chain validity is
    /// asserted by `activate_bind_device` or `offline_verify_current_token`.
    ///
    /// # Errors
    ///
    /// `NotInitialized` until a product key is configured;
    /// `MalformedToken`/`Crypto` on undecodable input; `InvalidArgument` if
    /// the token belongs to a different license code.
    pub fn import_token(&mut self, text: &str) -> EngineResult<()> {
        if !self.key_configured() {
            return Err(EngineError::NotInitialized);
        }
        let codec = self.codec.as_ref().expect("codec exists once key is set");
        let token = codec.import(text)?;

        let config = self.config.as_ref().expect("config exists once initialized");
        if token.license_code != config.license_code {
            return Err(EngineError::InvalidArgument(format!(
                "token license code {} does not match configured {}",
                token.license_code, config.license_code
            )));
        }

        debug!(token_id = %token.token_id, state_index = token.state_index, "token imported");
        self.token = Some(token);
        self.credentials = None;
        self.lifecycle = Lifecycle::TokenImported;
        Ok(())
    }

    /// Re-runs trust-chain and usage-chain verification against the held
    /// token without mutating any state.
    #[must_use]
    pub fn offline_verify_current_token(&self) -> VerificationOutcome {
        let Some(token) = &self.token else {
            return VerificationOutcome::fail("no token");
        };
        let Some(product_key) = &self.product_key else {
            return VerificationOutcome::fail("product public key not set");
        };

        if let Err(e) = self
            .verifier
            .verify(token, product_key, SignatureAlgorithm::Ed25519)
        {
            return VerificationOutcome::fail(e.to_string());
        }
        if let Err(e) = UsageLedger::verify_chain(token) {
            return VerificationOutcome::fail(e.to_string());
        }
        VerificationOutcome::ok("")
    }

    /// Verifies the held token and binds it to this device.
    ///
    /// First activation writes the holder and device binding and leaves
    /// `state_index` at zero. Re-activation of a token already bound to
    /// this device is idempotent: it re-confirms validity and touches
    /// neither the index nor the chain. A token bound to a different device
    /// yields `valid = false`.
    pub fn activate_bind_device(&mut self) -> EngineResult<VerificationOutcome> {
        if self.token.is_none() {
            return Ok(VerificationOutcome::fail("no token"));
        }
        if self.product_key.is_none() {
            return Ok(VerificationOutcome::fail("product public key not set"));
        }

        let outcome = self.offline_verify_current_token();
        if !outcome.valid {
            warn!(reason = %outcome.message, "activation verification failed");
            return Ok(outcome);
        }

        let holder = self
            .token
            .as_ref()
            .expect("token checked above")
            .holder_device_id
            .clone();
        match holder {
            Some(holder) => self.reactivate_bound(&holder),
            None => self.bind_first_activation(),
        }
    }

    /// Idempotent re-activation path: the token is already bound; restore
    /// the matching device credentials from the store.
    fn reactivate_bound(&mut self, holder: &DeviceId) -> EngineResult<VerificationOutcome> {
        let token = self.token.as_ref().expect("token present");
        let store = self.store.as_ref().expect("store exists once initialized");

        let record = match store.load_device_keys(&token.license_code)? {
            Some(record) if record.device_id == *holder => record,
            Some(record) => {
                return Ok(VerificationOutcome::fail(format!(
                    "token is bound to device {holder}, this device holds keys for {}",
                    record.device_id
                )));
            }
            None => {
                return Ok(VerificationOutcome::fail(format!(
                    "token is bound to device {holder} and no matching device keys are present"
                )));
            }
        };

        let signing_key = SigningKey::from_pkcs8_pem(&record.private_key_pem)?;
        self.credentials = Some(DeviceCredentials {
            device_id: record.device_id.clone(),
            signing_key,
        });

        // The imported snapshot may be older than what this machine already
        // persisted; the newer on-disk history wins and the session carries
        // on with the imported token.
        let token = self.token.as_ref().expect("token present");
        match store.save_snapshot(token) {
            Ok(()) | Err(EngineError::StaleState { .. }) => {}
            Err(e) => return Err(e),
        }

        info!(token_id = %token.token_id, device_id = %record.device_id, "re-activation confirmed");
        self.lifecycle = Lifecycle::Activated;
        Ok(VerificationOutcome::ok(""))
    }

    /// First-activation path: bind the token to this device.
    fn bind_first_activation(&mut self) -> EngineResult<VerificationOutcome> {
        let material = self
            .product_key_material
            .as_ref()
            .expect("key material exists once key is set");
        let seal_key = SealKey::derive(material.trim().as_bytes());

        let token = self.token.as_mut().expect("token present");
        let license_key_pem = open_string(&seal_key, &token.sealed_license_private_key)?;
        let license_key = SigningKey::from_pkcs8_pem(&license_key_pem)?;

        let store = self.store.as_ref().expect("store exists once initialized");
        let record = match store.load_device_keys(&token.license_code)? {
            Some(record) => record,
            None => {
                let keypair = KeyPair::generate();
                let record = DeviceKeyRecord {
                    device_id: self.device_id.clone().expect("device id cached at init"),
                    public_key_pem: keypair.verifying_key.to_public_key_pem()?,
                    private_key_pem: keypair.signing_key.to_pkcs8_pem()?,
                };
                store.save_device_keys(&token.license_code, &record)?;
                record
            }
        };

        let device_signing_key = SigningKey::from_pkcs8_pem(&record.private_key_pem)?;

        let payload = DeviceBinding::signing_payload(
            &record.device_id,
            &record.public_key_pem,
            &token.token_id,
        );
        let binding = DeviceBinding {
            device_id: record.device_id.clone(),
            public_key: record.public_key_pem.clone(),
            signature: license_key.sign(payload.as_bytes()).to_base64(),
        };

        token.holder_device_id = Some(record.device_id.clone());
        token.device_binding = Some(binding);
        token.state_index = 0;

        store.save_snapshot(token)?;
        info!(token_id = %token.token_id, device_id = %record.device_id, "device bound");

        self.credentials = Some(DeviceCredentials {
            device_id: record.device_id.clone(),
            signing_key: device_signing_key,
        });
        self.lifecycle = Lifecycle::Activated;
        Ok(VerificationOutcome::ok(""))
    }

    /// Appends one usage entry to the activated token's ledger.
    ///
    /// The append, the `state_index` increment, and the snapshot write
    /// commit together or not at all.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` on a malformed payload; storage and crypto errors
    /// propagate with the session state unchanged.
    pub fn record_usage(&mut self, payload_json: &str) -> EngineResult<VerificationOutcome> {
        let request = UsageRequest::from_json(payload_json)?;

        if self.lifecycle != Lifecycle::Activated {
            return Ok(VerificationOutcome::fail("not activated"));
        }
        let Some(credentials) = &self.credentials else {
            return Ok(VerificationOutcome::fail("device keys not initialized"));
        };
        let token = self.token.as_ref().expect("activated implies token");
        let store = self.store.as_ref().expect("store exists once initialized");

        let mut candidate = token.clone();
        let entry = UsageLedger::append(&mut candidate, &credentials.signing_key, &request)?;
        store.save_snapshot(&candidate)?;

        debug!(
            seq = entry.seq,
            action = %entry.action,
            device_id = %credentials.device_id,
            state_index = candidate.state_index,
            "usage recorded"
        );
        self.token = Some(candidate);
        Ok(VerificationOutcome::ok(""))
    }

    /// Returns a snapshot of session state.
    #[must_use]
    pub fn get_status(&self) -> StatusReport {
        match &self.token {
            Some(token) => StatusReport {
                has_token: true,
                is_activated: self.lifecycle == Lifecycle::Activated,
                issue_time: token.issue_time.as_secs(),
                expire_time: token.expire_time.as_secs(),
                state_index: token.state_index,
                token_id: token.token_id.to_string(),
                holder_device_id: token
                    .holder_device_id
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                app_id: token.app_id.clone(),
                license_code: token.license_code.clone(),
            },
            None => StatusReport {
                has_token: false,
                is_activated: false,
                issue_time: 0,
                expire_time: 0,
                state_index: 0,
                token_id: String::new(),
                holder_device_id: String::new(),
                app_id: String::new(),
                license_code: String::new(),
            },
        }
    }

    /// Exports the activated token as a sealed blob for hand-off.
    pub fn export_activated_token_encrypted(&self) -> EngineResult<String> {
        self.export(ExportMode::Activated)
    }

    /// Exports the token after usage recording, carrying new ledger entries.
    pub fn export_state_changed_token_encrypted(&self) -> EngineResult<String> {
        self.export(ExportMode::StateChanged)
    }

    fn export(&self, mode: ExportMode) -> EngineResult<String> {
        if self.lifecycle != Lifecycle::Activated {
            return Err(EngineError::NotActivated);
        }
        let token = self.token.as_ref().expect("activated implies token");
        let codec = self.codec.as_ref().expect("activated implies codec");
        let out = codec.export(token, mode)?;
        debug!(mode = %mode, bytes = out.len(), "token exported");
        Ok(out)
    }

    /// Returns the stable identifier of this device.
    ///
    /// # Errors
    ///
    /// `NotInitialized` before `initialize`.
    pub fn device_id(&self) -> EngineResult<DeviceId> {
        self.device_id.clone().ok_or(EngineError::NotInitialized)
    }

    /// Returns the held token, if any.
    #[must_use]
    pub fn current_token(&self) -> Option<&LicenseToken> {
        self.token.as_ref()
    }

    /// Returns true if the session holds an activated token.
    #[must_use]
    pub fn is_activated(&self) -> bool {
        self.lifecycle == Lifecycle::Activated
    }

    /// Releases all session state. Idempotent.
    pub fn shutdown(&mut self) {
        if self.lifecycle != Lifecycle::Uninitialized {
            info!("client shut down");
        }
        *self = Self::new();
    }

    fn key_configured(&self) -> bool {
        self.product_key.is_some()
    }
}

impl Default for LicenseClient {
    fn default() -> Self {
        Self::new()
    }
}

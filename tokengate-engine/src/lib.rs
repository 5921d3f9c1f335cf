//! License token lifecycle, trust chain, and usage ledger engine.
//!
//! This crate is the core behind every TokenGate SDK binding. It handles:
//! - Trust-chain verification: product (root) key → license key → token,
//!   plus the device binding written at activation
//! - One-time activation binding a token to a hardware fingerprint
//! - An append-only, hash-chained usage ledger with per-entry signatures
//! - Sealed import/export of tokens for device-to-device hand-off
//! - Persisted session state for idempotent re-activation
//!
//! # Design Principles
//!
//! - **Offline-first**: verification and activation are local computations;
//!   network coordination belongs to collaborators outside this crate
//! - **No singletons**: a [`LicenseClient`] is an explicit session object
//!   owned by the caller
//! - **Typed failures**: verification problems come back as
//!   `valid = false` plus a reason, never as panics, and are never retried
//!   automatically
//!
//! # Session flow
//!
//! ```no_run
//! use tokengate_engine::{ClientConfig, LicenseClient};
//!
//! # fn main() -> Result<(), tokengate_engine::EngineError> {
//! let mut client = LicenseClient::new();
//! client.initialize(ClientConfig::new("ACME-1"))?;
//! client.set_product_public_key("<product public key PEM>")?;
//! client.import_token("<sealed token blob>")?;
//! let outcome = client.activate_bind_device()?;
//! assert!(outcome.valid);
//! client.record_usage(r#"{"action":"api_call","params":{"fn":"x"}}"#)?;
//! let handoff = client.export_state_changed_token_encrypted()?;
//! assert!(handoff.len() <= tokengate_engine::MAX_EXPORT_BYTES);
//! # Ok(())
//! # }
//! ```

mod client;
mod codec;
mod config;
mod device;
mod error;
mod ledger;
mod store;
mod token;
mod trust;

pub use client::{LicenseClient, StatusReport};
pub use codec::{ExportMode, TokenCodec, MAX_EXPORT_BYTES};
pub use config::{ClientConfig, DEFAULT_STATE_DIR, DEFAULT_TCP_PORT, DEFAULT_UDP_PORT};
pub use device::DeviceFingerprint;
pub use error::{EngineError, EngineResult, ErrorKind};
pub use ledger::{ChainError, UsageLedger, UsageRequest};
pub use store::{DeviceKeyRecord, StateStore};
pub use token::{DeviceBinding, LicenseToken, SignatureAlgorithm, UsageChainEntry};
pub use trust::{TrustChainVerifier, VerificationOutcome, VerifyError};

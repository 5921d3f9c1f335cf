//! Persistent session state, keyed by license code.
//!
//! Layout under the configured root directory:
//!
//! ```text
//! <root>/<license_code>/current_state.json   latest token snapshot
//! <root>/<license_code>/device_keys.json     device identity + keypair
//! ```
//!
//! Writes go through a temp file and an atomic rename. Snapshots carry a
//! stale-writer check: a snapshot whose `state_index` is behind the one on
//! disk is refused, so two processes racing on the same ledger fail loudly
//! instead of silently losing entries.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::token::LicenseToken;
use tokengate_types::DeviceId;

/// Persisted device identity and keypair for one license code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceKeyRecord {
    /// The device fingerprint the keys belong to.
    pub device_id: DeviceId,
    /// Device signing public key (SPKI PEM).
    pub public_key_pem: String,
    /// Device signing private key (PKCS#8 PEM).
    pub private_key_pem: String,
}

/// File-backed state store for idempotent re-activation lookups.
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    /// Creates a store rooted at the given directory.
    ///
    /// The directory is created lazily on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn chain_dir(&self, license_code: &str) -> PathBuf {
        self.root.join(license_code)
    }

    fn snapshot_path(&self, license_code: &str) -> PathBuf {
        self.chain_dir(license_code).join("current_state.json")
    }

    fn device_keys_path(&self, license_code: &str) -> PathBuf {
        self.chain_dir(license_code).join("device_keys.json")
    }

    /// Loads the latest token snapshot for a license code, if any.
    pub fn load_snapshot(&self, license_code: &str) -> EngineResult<Option<LicenseToken>> {
        read_json(&self.snapshot_path(license_code))
    }

    /// Persists a token snapshot.
    ///
    /// Refuses to overwrite a snapshot whose `state_index` is ahead of the
    /// one being written (stale-writer rejection).
    pub fn save_snapshot(&self, token: &LicenseToken) -> EngineResult<()> {
        if let Some(on_disk) = self.load_snapshot(&token.license_code)? {
            if on_disk.token_id == token.token_id && on_disk.state_index > token.state_index {
                warn!(
                    license_code = %token.license_code,
                    on_disk = on_disk.state_index,
                    ours = token.state_index,
                    "refusing to overwrite newer persisted state"
                );
                return Err(EngineError::StaleState {
                    on_disk: on_disk.state_index,
                    ours: token.state_index,
                });
            }
        }

        let json = serde_json::to_vec_pretty(token)?;
        atomic_write(&self.snapshot_path(&token.license_code), &json)?;
        debug!(
            license_code = %token.license_code,
            state_index = token.state_index,
            "persisted token snapshot"
        );
        Ok(())
    }

    /// Loads the persisted device keys for a license code, if any.
    pub fn load_device_keys(&self, license_code: &str) -> EngineResult<Option<DeviceKeyRecord>> {
        read_json(&self.device_keys_path(license_code))
    }

    /// Persists device keys for a license code.
    pub fn save_device_keys(
        &self,
        license_code: &str,
        record: &DeviceKeyRecord,
    ) -> EngineResult<()> {
        let json = serde_json::to_vec_pretty(record)?;
        atomic_write(&self.device_keys_path(license_code), &json)?;
        debug!(license_code, device_id = %record.device_id, "persisted device keys");
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(EngineError::Storage(format!("{}: {e}", path.display()))),
    };
    let value = serde_json::from_slice(&bytes)
        .map_err(|e| EngineError::Storage(format!("{}: {e}", path.display())))?;
    Ok(Some(value))
}

fn atomic_write(path: &Path, bytes: &[u8]) -> EngineResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| EngineError::Storage(format!("{}: no parent directory", path.display())))?;
    fs::create_dir_all(dir).map_err(|e| EngineError::Storage(format!("{}: {e}", dir.display())))?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|e| EngineError::Storage(format!("{}: {e}", tmp.display())))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        EngineError::Storage(format!("{}: {e}", path.display()))
    })?;
    Ok(())
}

//! Client session configuration.
//!
//! An explicit struct with enumerated fields; loose JSON config maps are
//! rejected at the binding layer, not here. The UDP/TCP ports and registry
//! URL belong to network collaborators (peer discovery, registry
//! activation) that sit outside this engine; they are validated and
//! carried, never dialed.

use std::path::PathBuf;

use crate::error::{EngineError, EngineResult};

/// Default UDP port for collaborator peer discovery.
pub const DEFAULT_UDP_PORT: u16 = 13325;

/// Default TCP port for collaborator peer communication.
pub const DEFAULT_TCP_PORT: u16 = 23325;

/// Default state directory, relative to the working directory.
pub const DEFAULT_STATE_DIR: &str = ".tokengate_state";

/// Configuration for one client session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// License identifier this session operates on.
    pub license_code: String,
    /// UDP port handed to the discovery collaborator.
    pub udp_port: u16,
    /// TCP port handed to the transfer collaborator.
    pub tcp_port: u16,
    /// Optional WAN registry URL, handed to the registry collaborator.
    pub registry_url: Option<String>,
    /// Root directory for persisted session state.
    pub state_dir: PathBuf,
}

impl ClientConfig {
    /// Creates a configuration with default ports and state directory.
    #[must_use]
    pub fn new(license_code: impl Into<String>) -> Self {
        Self {
            license_code: license_code.into(),
            udp_port: DEFAULT_UDP_PORT,
            tcp_port: DEFAULT_TCP_PORT,
            registry_url: None,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        }
    }

    /// Sets the state directory.
    #[must_use]
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    /// Sets the registry URL.
    #[must_use]
    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = Some(url.into());
        self
    }

    /// Validates the configuration, substituting defaults for zero ports.
    pub fn validated(mut self) -> EngineResult<Self> {
        if self.license_code.trim().is_empty() {
            return Err(EngineError::InvalidArgument(
                "license_code must not be empty".to_string(),
            ));
        }
        if self
            .license_code
            .contains(|c: char| c == '/' || c == '\\' || c == '\0')
        {
            return Err(EngineError::InvalidArgument(
                "license_code must not contain path separators".to_string(),
            ));
        }
        if let Some(url) = &self.registry_url {
            if url.trim().is_empty() {
                self.registry_url = None;
            }
        }
        if self.udp_port == 0 {
            self.udp_port = DEFAULT_UDP_PORT;
        }
        if self.tcp_port == 0 {
            self.tcp_port = DEFAULT_TCP_PORT;
        }
        Ok(self)
    }
}

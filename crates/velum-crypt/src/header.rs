//! The vault header: a plaintext `crypt.json` record at the vault root.
//!
//! `{"salt":"<base64>","kdf_parameters":{"time":1,"memory":65536,"threads":4}}`
//!
//! The header is the single source of truth for opening a vault: its
//! presence marks a directory as encrypted, and it is written once at
//! creation and never rewritten. The salt uses the standard base64
//! alphabet (names use the url-safe one).

use serde::{Deserialize, Serialize};

use velum_core::{VelumError, VelumResult};

use crate::kdf::{KdfParams, Salt};

/// Reserved name of the header entry at the vault root. Never encrypted,
/// never listed, and not available as an entry name to callers.
pub const HEADER_NAME: &str = "crypt.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultHeader {
    pub salt: Salt,
    pub kdf_parameters: KdfParams,
}

impl VaultHeader {
    /// A header for a new vault: fresh salt, default KDF parameters.
    pub fn generate() -> VelumResult<Self> {
        Ok(Self {
            salt: Salt::generate()?,
            kdf_parameters: KdfParams::default(),
        })
    }

    pub fn to_bytes(&self) -> VelumResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| VelumError::BadHeader(format!("encoding: {e}")))
    }

    pub fn from_bytes(data: &[u8]) -> VelumResult<Self> {
        serde_json::from_slice(data).map_err(|e| VelumError::BadHeader(e.to_string()))
    }
}

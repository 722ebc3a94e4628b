//! Key derivation: Argon2id (password, salt) → encryption key.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

use velum_core::{VelumError, VelumResult};

use crate::{KEY_LEN, SALT_LEN};

/// A 32-byte per-vault salt.
///
/// Generated once at vault creation, persisted verbatim in the header,
/// never rotated. Not secret; serializes as standard-alphabet base64.
#[derive(Clone, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Draw a fresh salt from the thread-local CSPRNG.
    pub fn generate() -> VelumResult<Self> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng()
            .try_fill_bytes(&mut salt)
            .map_err(|e| VelumError::Rng(e.to_string()))?;
        Ok(Self(salt))
    }

    pub fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Salt({})", STANDARD.encode(self.0))
    }
}

impl Serialize for Salt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Salt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let decoded = STANDARD
            .decode(&encoded)
            .map_err(|e| D::Error::custom(format!("salt is not valid base64: {e}")))?;
        let bytes: [u8; SALT_LEN] = decoded
            .try_into()
            .map_err(|v: Vec<u8>| D::Error::custom(format!("salt is {} bytes, want {SALT_LEN}", v.len())))?;
        Ok(Self(bytes))
    }
}

/// Argon2id cost parameters, persisted alongside the salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Iteration count.
    pub time: u32,
    /// Memory cost in KiB.
    pub memory: u32,
    /// Lane count.
    pub threads: u8,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            time: 1,
            memory: 64 * 1024,
            threads: 4,
        }
    }
}

/// A 256-bit encryption key derived from a password.
///
/// Held only in memory for the lifetime of an open vault; zeroized on drop.
#[derive(Clone)]
pub struct Key {
    bytes: [u8; KEY_LEN],
}

impl Key {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key").field("bytes", &"[REDACTED]").finish()
    }
}

/// Derive the vault key from a password with Argon2id.
///
/// Deterministic for the same inputs. The password is an opaque byte
/// string; the caller's encoding must be stable across opens. Parameter
/// validation (zero memory, zero time) is argon2's and fails loudly.
pub fn derive_key(password: &[u8], salt: &Salt, params: &KdfParams) -> VelumResult<Key> {
    let argon2_params = Params::new(
        params.memory,
        params.time,
        u32::from(params.threads),
        Some(KEY_LEN),
    )
    .map_err(|e| VelumError::Kdf(format!("invalid Argon2id params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password, salt.as_bytes(), &mut key)
        .map_err(|e| VelumError::Kdf(format!("Argon2id failed: {e}")))?;

    Ok(Key::from_bytes(key))
}

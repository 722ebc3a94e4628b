//! AES-CBC block primitive.
//!
//! One [`CbcCipher`] holds the expanded AES key schedule for the lifetime
//! of an open vault. Every call builds a CBC mode wrapper around a clone
//! of that schedule with the caller's IV, so the expensive key expansion
//! runs once and only the IV changes between superblocks. Calls take
//! `&self`; there is no interior mutability to guard.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockCipher, BlockDecrypt, BlockDecryptMut, BlockEncrypt, BlockEncryptMut, InnerIvInit, KeyInit};
use aes::{Aes128, Aes192, Aes256};

use velum_core::{VelumError, VelumResult};

use crate::BLOCK_LEN;

#[derive(Clone)]
enum KeySchedule {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

/// A keyed AES cipher in CBC mode. AES-128/192/256 is selected by key
/// length; vault keys are always 32 bytes (AES-256).
#[derive(Clone)]
pub struct CbcCipher {
    schedule: KeySchedule,
}

impl CbcCipher {
    pub fn new(key: &[u8]) -> VelumResult<Self> {
        let invalid = |e: aes::cipher::InvalidLength| VelumError::CipherInit(e.to_string());
        let schedule = match key.len() {
            16 => KeySchedule::Aes128(Aes128::new_from_slice(key).map_err(invalid)?),
            24 => KeySchedule::Aes192(Aes192::new_from_slice(key).map_err(invalid)?),
            32 => KeySchedule::Aes256(Aes256::new_from_slice(key).map_err(invalid)?),
            n => {
                return Err(VelumError::CipherInit(format!(
                    "unsupported key length {n}, want 16, 24, or 32"
                )))
            }
        };
        Ok(Self { schedule })
    }

    /// CBC-encrypt `buf` in place. `iv` must be 16 bytes and `buf` a
    /// multiple of 16.
    pub fn encrypt(&self, iv: &[u8], buf: &mut [u8]) {
        debug_assert_eq!(iv.len(), BLOCK_LEN);
        debug_assert_eq!(buf.len() % BLOCK_LEN, 0);
        match &self.schedule {
            KeySchedule::Aes128(aes) => cbc_encrypt(aes, iv, buf),
            KeySchedule::Aes192(aes) => cbc_encrypt(aes, iv, buf),
            KeySchedule::Aes256(aes) => cbc_encrypt(aes, iv, buf),
        }
    }

    /// CBC-decrypt `buf` in place. Same size requirements as `encrypt`.
    pub fn decrypt(&self, iv: &[u8], buf: &mut [u8]) {
        debug_assert_eq!(iv.len(), BLOCK_LEN);
        debug_assert_eq!(buf.len() % BLOCK_LEN, 0);
        match &self.schedule {
            KeySchedule::Aes128(aes) => cbc_decrypt(aes, iv, buf),
            KeySchedule::Aes192(aes) => cbc_decrypt(aes, iv, buf),
            KeySchedule::Aes256(aes) => cbc_decrypt(aes, iv, buf),
        }
    }
}

impl std::fmt::Debug for CbcCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bits = match self.schedule {
            KeySchedule::Aes128(_) => 128,
            KeySchedule::Aes192(_) => 192,
            KeySchedule::Aes256(_) => 256,
        };
        write!(f, "CbcCipher(aes-{bits})")
    }
}

fn cbc_encrypt<C>(schedule: &C, iv: &[u8], buf: &mut [u8])
where
    C: BlockCipher + BlockEncrypt + Clone,
{
    let mut mode = cbc::Encryptor::<C>::inner_iv_init(schedule.clone(), GenericArray::from_slice(iv));
    for block in buf.chunks_exact_mut(BLOCK_LEN) {
        mode.encrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

fn cbc_decrypt<C>(schedule: &C, iv: &[u8], buf: &mut [u8])
where
    C: BlockCipher + BlockDecrypt + Clone,
{
    let mut mode = cbc::Decryptor::<C>::inner_iv_init(schedule.clone(), GenericArray::from_slice(iv));
    for block in buf.chunks_exact_mut(BLOCK_LEN) {
        mode.decrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

/// Draw a fresh random IV from the thread-local CSPRNG.
pub(crate) fn random_iv() -> VelumResult<[u8; BLOCK_LEN]> {
    use rand::RngCore;

    let mut iv = [0u8; BLOCK_LEN];
    rand::thread_rng()
        .try_fill_bytes(&mut iv)
        .map_err(|e| VelumError::Rng(e.to_string()))?;
    Ok(iv)
}
